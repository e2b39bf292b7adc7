//! Search primitives shared by every map operation.
//!
//! Reads use [`locate`]; mutations first record the root-to-target path of a
//! descent ([`descend`], [`path_to_equal`], [`first_not_before`]) and hand it to
//! the insertion or deletion engine.

use std::cmp::Ordering;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::node::{Node, PATH_CAPACITY, Side};
use crate::comparator::Comparator;
use crate::position::Position;

/// Nodes visited by a descent, root first, and the side taken at each.
///
/// `sides` is one shorter than `nodes` when the path ends at a node, and as
/// long as `nodes` when it ends at an empty slot below the last node.
pub(super) struct SearchPath<'a, K, V> {
    pub(super) nodes: SmallVec<[&'a Node<K, V>; PATH_CAPACITY]>,
    pub(super) sides: SmallVec<[Side; PATH_CAPACITY]>,
}

impl<'a, K, V> SearchPath<'a, K, V> {
    fn new() -> Self {
        Self {
            nodes: SmallVec::new(),
            sides: SmallVec::new(),
        }
    }

    fn push(&mut self, node: &'a Node<K, V>, side: Side) {
        self.nodes.push(node);
        self.sides.push(side);
    }

    /// Cuts the path so it ends at its `length`-th node.
    fn truncate(&mut self, length: usize) {
        self.nodes.truncate(length);
        self.sides.truncate(length.saturating_sub(1));
    }

    /// The node the path ends at.
    pub(super) fn target(&self) -> Option<&'a Node<K, V>> {
        self.nodes.last().copied()
    }
}

/// Outcome of a descent towards a key.
pub(super) enum Descent<'a, K, V> {
    /// The path ends at the node holding the key.
    Occupied(SearchPath<'a, K, V>),
    /// The path ends at the empty slot where the key belongs.
    Vacant(SearchPath<'a, K, V>),
}

/// Finds the node whose key compares equal to `key`.
pub(super) fn locate<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    key: &K,
    comparator: &C,
) -> Option<&'a Node<K, V>> {
    let mut link = root;
    while let Some(node) = link {
        link = match comparator.compare(key, &node.key) {
            Ordering::Less => node.left.as_ref(),
            Ordering::Greater => node.right.as_ref(),
            Ordering::Equal => return Some(node),
        };
    }
    None
}

/// Records the path to `key`, or to the slot where it would be inserted.
pub(super) fn descend<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    key: &K,
    comparator: &C,
) -> Descent<'a, K, V> {
    let mut path = SearchPath::new();
    let mut link = root;
    while let Some(node) = link {
        let side = match comparator.compare(key, &node.key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                path.nodes.push(node);
                return Descent::Occupied(path);
            }
        };
        path.push(node, side);
        link = node.child(side).as_ref();
    }
    Descent::Vacant(path)
}

/// Records the path to the node holding `key`, or `None` when it is absent.
pub(super) fn path_to_equal<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    key: &K,
    comparator: &C,
) -> Option<SearchPath<'a, K, V>> {
    match descend(root, key, comparator) {
        Descent::Occupied(path) => Some(path),
        Descent::Vacant(_) => None,
    }
}

/// Records the path to the first node whose key is not before `position`.
///
/// For [`Position::BeforeStart`] that is the leftmost node; for
/// [`Position::AfterEnd`] there is none. The path is empty when no key
/// qualifies.
pub(super) fn first_not_before<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    position: Position<&K>,
    comparator: &C,
) -> SearchPath<'a, K, V> {
    let mut path = SearchPath::new();
    let mut link = root;
    match position {
        Position::BeforeStart => {
            while let Some(node) = link {
                path.push(node, Side::Left);
                link = node.left.as_ref();
            }
            path.sides.pop();
        }
        Position::Key(key) => {
            let mut found = 0;
            while let Some(node) = link {
                let side = if comparator.compare(key, &node.key).is_le() {
                    found = path.nodes.len() + 1;
                    Side::Left
                } else {
                    Side::Right
                };
                path.push(node, side);
                link = node.child(side).as_ref();
            }
            path.truncate(found);
        }
        Position::AfterEnd => {}
    }
    path
}

//! Path-copying insertion.
//!
//! The search path is copied, a red leaf is hung at the insertion point, and
//! red-red violations are repaired bottom-up on the copies: a red uncle is
//! handled by recolouring and moving two levels up, a black uncle by a single
//! or double rotation, after which the tree is balanced.

use super::node::{ClonedPath, Color, Link, Node};
use super::search::SearchPath;
use super::ReferenceCounter;

/// Inserts a new entry at the vacant position the search path ends at.
pub(super) fn insert<K: Clone, V: Clone>(
    search: &SearchPath<'_, K, V>,
    key: K,
    value: V,
) -> Link<K, V> {
    let mut path = ClonedPath::copy(&search.nodes, &search.sides);
    path.grow_counts(path.len());
    path.push(Node::new_red(key, value));
    fix_red_red(&mut path);
    path.make_root_black();
    path.seal()
}

/// Replaces the value of the entry the search path ends at.
///
/// The shape of the tree is unchanged, so no rebalancing is needed.
pub(super) fn replace_value<K: Clone, V: Clone>(search: &SearchPath<'_, K, V>, value: V) -> Link<K, V> {
    let mut path = ClonedPath::copy(&search.nodes, &search.sides);
    let target = path.len() - 1;
    path.node_mut(target).value = value;
    path.seal()
}

fn fix_red_red<K: Clone, V: Clone>(path: &mut ClonedPath<K, V>) {
    let mut current = path.len() - 1;
    while current >= 2 {
        let parent = current - 1;
        let grandparent = current - 2;
        if !path.node(parent).is_red() || !path.node(current).is_red() {
            break;
        }

        let parent_side = path.side(grandparent);
        let uncle_side = parent_side.opposite();
        let red_uncle = path
            .node(grandparent)
            .child(uncle_side)
            .as_ref()
            .filter(|uncle| uncle.is_red())
            .map(|uncle| uncle.with_color(Color::Black));

        if let Some(uncle) = red_uncle {
            *path.node_mut(grandparent).child_mut(uncle_side) = Some(ReferenceCounter::new(uncle));
            path.node_mut(grandparent).color = Color::Red;
            path.node_mut(parent).color = Color::Black;
            current = grandparent;
            continue;
        }

        if path.side(parent) == parent_side {
            rotate_outer(path, grandparent);
        } else {
            rotate_inner(path, grandparent);
        }
        break;
    }
}

/// Red parent and red child lean the same way: the parent replaces the
/// grandparent, which becomes its red child on the far side.
fn rotate_outer<K, V>(path: &mut ClonedPath<K, V>, grandparent: usize) {
    let side = path.side(grandparent);
    let mut demoted = path.remove(grandparent);
    let parent = path.node_mut(grandparent);

    *demoted.child_mut(side) = parent.take_child(side.opposite());
    demoted.color = Color::Red;
    demoted.recount();

    parent.color = Color::Black;
    *parent.child_mut(side.opposite()) = Some(ReferenceCounter::new(demoted));
    path.recount(grandparent);
}

/// Red parent and red child zig-zag: the child rises above both, taking the
/// parent on one side and the grandparent on the other. Whatever part of the
/// path hung below the child moves under whichever of the two inherits it.
fn rotate_inner<K, V>(path: &mut ClonedPath<K, V>, grandparent: usize) {
    let side = path.side(grandparent);
    let mut outer = path.remove(grandparent);
    let mut parent = path.remove(grandparent);
    let top = grandparent;
    let below = path.pending_side(top);
    let below_count = path.pending_count(top);

    let node = path.node_mut(top);
    *parent.child_mut(side.opposite()) = node.take_child(side);
    *outer.child_mut(side) = node.take_child(side.opposite());
    node.color = Color::Black;
    outer.color = Color::Red;
    parent.recount();
    outer.recount();

    match below {
        None => {
            *node.child_mut(side) = Some(ReferenceCounter::new(parent));
            *node.child_mut(side.opposite()) = Some(ReferenceCounter::new(outer));
        }
        Some(below_side) if below_side == side => {
            parent.count += below_count;
            *node.child_mut(side.opposite()) = Some(ReferenceCounter::new(outer));
            path.insert(top + 1, parent, side.opposite());
        }
        Some(_) => {
            outer.count += below_count;
            *node.child_mut(side) = Some(ReferenceCounter::new(parent));
            path.insert(top + 1, outer, side);
        }
    }
    path.recount(top);
}

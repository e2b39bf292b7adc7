//! Rank navigation over subtree counts.
//!
//! Every node knows the size of its subtree, so the entry at a given rank, or
//! the rank of a key boundary, is found in a single root-to-leaf descent that
//! skips whole subtrees.
//!
//! Ranks are signed: a boundary can sit before the first entry, and an offset
//! can walk past either end. Running out of tree is reported as
//! [`Seek::Overflow`] with the residual offset rather than as an error.

use std::cmp::Ordering;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::node::{Node, PATH_CAPACITY, count};
use crate::comparator::Comparator;
use crate::position::Position;

/// Result of a rank walk.
#[derive(Debug)]
pub(super) enum Seek<'a, K, V> {
    /// The walk ended on this node.
    Found(&'a Node<K, V>),
    /// The walk ran off the tree. Negative values count positions before the
    /// first entry (`-1` is the slot just before it); positive values count
    /// positions after the last (`1` is the slot just after it).
    Overflow(isize),
}

impl<'a, K, V> Seek<'a, K, V> {
    /// Collapses the result to a key position.
    pub(super) fn into_position(self) -> Position<&'a K> {
        match self {
            Self::Found(node) => Position::Key(&node.key),
            Self::Overflow(remaining) if remaining < 0 => Position::BeforeStart,
            Self::Overflow(_) => Position::AfterEnd,
        }
    }
}

/// Converts a subtree size to a signed rank.
#[inline]
pub(super) fn signed(size: usize) -> isize {
    isize::try_from(size).unwrap_or(isize::MAX)
}

/// Returns the node at zero-based in-order `index` within the subtree.
pub(super) fn select<K, V>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    index: usize,
) -> Option<&Node<K, V>> {
    let mut link = root;
    let mut index = index;
    while let Some(node) = link {
        let left = count(node.left.as_ref());
        match index.cmp(&left) {
            Ordering::Less => link = node.left.as_ref(),
            Ordering::Equal => return Some(node),
            Ordering::Greater => {
                index -= left + 1;
                link = node.right.as_ref();
            }
        }
    }
    None
}

/// Walks `offset` entries forward from the slot before the subtree's first
/// entry: an offset of 1 is the first entry, 2 the second, and so on.
///
/// An offset beyond the subtree yields the positive residual; an offset of 0
/// or less yields the corresponding negative one.
pub(super) fn forward_offset<K, V>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    offset: isize,
) -> Seek<'_, K, V> {
    let total = signed(count(root));
    if offset < 1 {
        return Seek::Overflow(offset - 1);
    }
    if offset > total {
        return Seek::Overflow(offset - total);
    }
    offset_within(root, offset.unsigned_abs() - 1)
}

/// Walks `-offset` entries backward from the slot after the subtree's last
/// entry: an offset of -1 is the last entry, -2 the one before it, and so on.
///
/// An offset beyond the subtree yields the negative residual; an offset of 0
/// or more yields the corresponding positive one.
pub(super) fn backward_offset<K, V>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    offset: isize,
) -> Seek<'_, K, V> {
    let total = signed(count(root));
    if offset > -1 {
        return Seek::Overflow(offset + 1);
    }
    if -offset > total {
        return Seek::Overflow(offset + total);
    }
    offset_within(root, (total + offset).unsigned_abs())
}

fn offset_within<K, V>(root: Option<&ReferenceCounter<Node<K, V>>>, index: usize) -> Seek<'_, K, V> {
    select(root, index).map_or(Seek::Overflow(0), Seek::Found)
}

/// A node passed while locating a boundary.
pub(super) struct Visit<'a, K, V> {
    pub(super) node: &'a Node<K, V>,
    /// Rank of the first entry in the node's subtree.
    pub(super) low: usize,
    /// Whether the descent continued into the left child.
    pub(super) went_left: bool,
}

/// The descent that located a boundary, root first, and the boundary's rank.
///
/// Keeping the path lets a rank near the boundary be reached by resuming from
/// the deepest visited subtree that holds it instead of starting over at the
/// root.
pub(super) struct BoundaryWalk<'a, K, V> {
    pub(super) rank: isize,
    pub(super) visits: SmallVec<[Visit<'a, K, V>; PATH_CAPACITY]>,
}

impl<K, V> BoundaryWalk<'_, K, V> {
    /// The deepest visit whose subtree holds `target`, with `target` relative
    /// to that subtree.
    pub(super) fn deepest_holding(&self, target: usize) -> Option<(usize, usize)> {
        self.visits
            .iter()
            .enumerate()
            .rev()
            .find(|(_, visit)| visit.low <= target && target < visit.low + visit.node.count)
            .map(|(depth, visit)| (depth, target - visit.low))
    }
}

/// Locates `position`, recording the nodes passed on the way down.
///
/// An entry is before a key boundary when it compares less than the key, or,
/// for an `inclusive` boundary, less than or equal. `BeforeStart` ranks at -1
/// and `AfterEnd` at the map length regardless of `inclusive`; neither needs a
/// descent.
pub(super) fn walk_to_boundary<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    position: Position<&K>,
    inclusive: bool,
    comparator: &C,
) -> BoundaryWalk<'a, K, V> {
    let mut visits = SmallVec::new();
    let key = match position {
        Position::BeforeStart => return BoundaryWalk { rank: -1, visits },
        Position::AfterEnd => {
            return BoundaryWalk {
                rank: signed(count(root)),
                visits,
            };
        }
        Position::Key(key) => key,
    };

    let mut before = 0;
    let mut link = root;
    while let Some(node) = link {
        let ordering = comparator.compare(&node.key, key);
        let is_before = if inclusive {
            ordering.is_le()
        } else {
            ordering.is_lt()
        };
        visits.push(Visit {
            node: &**node,
            low: before,
            went_left: !is_before,
        });
        if is_before {
            before += count(node.left.as_ref()) + 1;
            link = node.right.as_ref();
        } else {
            link = node.left.as_ref();
        }
    }
    BoundaryWalk {
        rank: signed(before) - 1,
        visits,
    }
}

/// Rank of the last entry that lies before `position`, or -1 when none does.
pub(super) fn boundary_rank<K, V, C: Comparator<K>>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    position: Position<&K>,
    inclusive: bool,
    comparator: &C,
) -> isize {
    walk_to_boundary(root, position, inclusive, comparator).rank
}

/// Finds the entry `offset` ranks away from the boundary `position`.
///
/// An offset of 1 addresses the first entry not before the boundary, 0 the
/// last entry before it, and so on in both directions.
pub(super) fn find_node<'a, K, V, C: Comparator<K>>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    position: Position<&K>,
    inclusive: bool,
    offset: isize,
    comparator: &C,
) -> Seek<'a, K, V> {
    match position {
        Position::BeforeStart => forward_offset(root, offset),
        Position::AfterEnd => backward_offset(root, offset),
        Position::Key(_) => {
            let boundary = boundary_rank(root, position, inclusive, comparator);
            forward_offset(root, boundary.saturating_add(offset).saturating_add(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::NaturalOrder;
    use crate::persistent::node::{Color, Link};
    use rstest::rstest;

    /// Builds a perfectly balanced tree over a sorted slice.
    fn balanced(keys: &[i32]) -> Link<i32, ()> {
        if keys.is_empty() {
            return None;
        }
        let middle = keys.len() / 2;
        let mut node = Node::new_red(keys[middle], ());
        node.color = Color::Black;
        node.left = balanced(&keys[..middle]);
        node.right = balanced(&keys[middle + 1..]);
        node.recount();
        Some(ReferenceCounter::new(node))
    }

    fn found(seek: Seek<'_, i32, ()>) -> Result<i32, isize> {
        match seek {
            Seek::Found(node) => Ok(node.key),
            Seek::Overflow(remaining) => Err(remaining),
        }
    }

    const KEYS: [i32; 5] = [1, 2, 3, 5, 8];

    #[rstest]
    #[case(0, Some(1))]
    #[case(3, Some(5))]
    #[case(4, Some(8))]
    #[case(5, None)]
    fn test_select(#[case] index: usize, #[case] expected: Option<i32>) {
        let root = balanced(&KEYS);
        assert_eq!(select(root.as_ref(), index).map(|node| node.key), expected);
    }

    #[rstest]
    #[case(1, Ok(1))]
    #[case(5, Ok(8))]
    #[case(6, Err(1))]
    #[case(9, Err(4))]
    #[case(0, Err(-1))]
    #[case(-3, Err(-4))]
    fn test_forward_offset(#[case] offset: isize, #[case] expected: Result<i32, isize>) {
        let root = balanced(&KEYS);
        assert_eq!(found(forward_offset(root.as_ref(), offset)), expected);
    }

    #[rstest]
    #[case(-1, Ok(8))]
    #[case(-5, Ok(1))]
    #[case(-6, Err(-1))]
    #[case(0, Err(1))]
    #[case(2, Err(3))]
    fn test_backward_offset(#[case] offset: isize, #[case] expected: Result<i32, isize>) {
        let root = balanced(&KEYS);
        assert_eq!(found(backward_offset(root.as_ref(), offset)), expected);
    }

    #[rstest]
    fn test_offsets_on_empty_tree_overflow() {
        assert_eq!(found(forward_offset::<i32, ()>(None, 2)), Err(2));
        assert_eq!(found(backward_offset::<i32, ()>(None, -2)), Err(-2));
    }

    #[rstest]
    #[case(Position::Key(&4), false, 2)]
    #[case(Position::Key(&5), false, 2)]
    #[case(Position::Key(&5), true, 3)]
    #[case(Position::Key(&0), true, -1)]
    #[case(Position::Key(&9), false, 4)]
    #[case(Position::BeforeStart, true, -1)]
    #[case(Position::AfterEnd, false, 5)]
    fn test_boundary_rank(#[case] position: Position<&i32>, #[case] inclusive: bool, #[case] expected: isize) {
        let root = balanced(&KEYS);
        assert_eq!(boundary_rank(root.as_ref(), position, inclusive, &NaturalOrder), expected);
    }

    #[rstest]
    fn test_walk_to_boundary_records_subtree_ranks() {
        let root = balanced(&KEYS);
        let walk = walk_to_boundary(root.as_ref(), Position::Key(&4), false, &NaturalOrder);
        assert_eq!(walk.rank, 2);
        let visited: Vec<(i32, usize, bool)> = walk
            .visits
            .iter()
            .map(|visit| (visit.node.key, visit.low, visit.went_left))
            .collect();
        assert_eq!(visited, vec![(3, 0, false), (8, 3, true), (5, 3, true)]);
        assert_eq!(walk.deepest_holding(3), Some((2, 0)));
        assert_eq!(walk.deepest_holding(4), Some((1, 1)));
        assert_eq!(walk.deepest_holding(0), Some((0, 0)));
        assert_eq!(walk.deepest_holding(5), None);
    }

    #[rstest]
    fn test_walk_to_sentinel_visits_nothing() {
        let root = balanced(&KEYS);
        let walk = walk_to_boundary(root.as_ref(), Position::AfterEnd, true, &NaturalOrder);
        assert_eq!(walk.rank, 5);
        assert!(walk.visits.is_empty());
    }

    #[rstest]
    #[case(Position::Key(&4), false, 1, Position::Key(&5))]
    #[case(Position::Key(&4), false, 2, Position::Key(&8))]
    #[case(Position::Key(&4), false, 0, Position::Key(&3))]
    #[case(Position::Key(&4), false, -10, Position::BeforeStart)]
    #[case(Position::Key(&4), false, 3, Position::AfterEnd)]
    #[case(Position::Key(&5), true, 1, Position::Key(&8))]
    #[case(Position::BeforeStart, false, 1, Position::Key(&1))]
    #[case(Position::BeforeStart, false, 0, Position::BeforeStart)]
    #[case(Position::AfterEnd, false, -1, Position::Key(&8))]
    #[case(Position::AfterEnd, false, 0, Position::AfterEnd)]
    fn test_find_node(
        #[case] position: Position<&i32>,
        #[case] inclusive: bool,
        #[case] offset: isize,
        #[case] expected: Position<&i32>,
    ) {
        let root = balanced(&KEYS);
        let seek = find_node(root.as_ref(), position, inclusive, offset, &NaturalOrder);
        assert_eq!(seek.into_position(), expected);
    }
}

//! Lazy, explicit-stack iteration.
//!
//! An [`Entries`] iterator seeks to its starting rank in one descent, keeping
//! only the ancestors it still has to visit on a stack, and then yields one
//! entry per step. Nodes are never mutated after publication, so an iterator
//! stays valid while newer versions of the map are built from the same tree.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::node::{Node, PATH_CAPACITY, count};
use super::rank::{BoundaryWalk, signed, walk_to_boundary};
use crate::comparator::Comparator;
use crate::position::Position;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    Ascending,
    Descending,
}

/// A lazy iterator over `(key, value)` pairs of a
/// [`PersistentRankedMap`](super::PersistentRankedMap), in ascending or
/// descending key order.
///
/// Created by [`entries`](super::PersistentRankedMap::entries),
/// [`forward_iter`](super::PersistentRankedMap::forward_iter),
/// [`backward_iter`](super::PersistentRankedMap::backward_iter) and
/// [`get_range`](super::PersistentRankedMap::get_range).
///
/// Seeking costs O(log N); every further step is amortized O(1).
pub struct Entries<'a, K, V> {
    stack: SmallVec<[&'a Node<K, V>; PATH_CAPACITY]>,
    direction: Direction,
    remaining: usize,
}

impl<'a, K, V> Entries<'a, K, V> {
    pub(super) fn empty() -> Self {
        Self {
            stack: SmallVec::new(),
            direction: Direction::Ascending,
            remaining: 0,
        }
    }

    /// Every entry in ascending order.
    pub(super) fn ascending(root: Option<&'a ReferenceCounter<Node<K, V>>>) -> Self {
        Self::ascending_from(root, 0)
    }

    /// Every entry in descending order.
    pub(super) fn descending(root: Option<&'a ReferenceCounter<Node<K, V>>>) -> Self {
        match count(root).checked_sub(1) {
            Some(last) => Self::descending_from(root, last),
            None => Self::empty(),
        }
    }

    /// Entries from zero-based rank `start` to the last, ascending.
    ///
    /// The stack holds the start node and every ancestor the walk went left
    /// from: exactly the nodes still to come whose left subtree is done.
    pub(super) fn ascending_from(root: Option<&'a ReferenceCounter<Node<K, V>>>, start: usize) -> Self {
        Self::starting_at(root, Direction::Ascending, start)
    }

    /// Entries from zero-based rank `start` down to the first, descending.
    ///
    /// Mirror image of [`Entries::ascending_from`]: the stack holds the start
    /// node and every ancestor the walk went right from.
    pub(super) fn descending_from(root: Option<&'a ReferenceCounter<Node<K, V>>>, start: usize) -> Self {
        Self::starting_at(root, Direction::Descending, start)
    }

    /// Ascends from the entry `offset` ranks away from the boundary.
    ///
    /// The start rank is clamped into the map, so an offset running off the
    /// front starts at the first entry and one running off the back yields
    /// nothing.
    pub(super) fn keyed_ascending<C: Comparator<K>>(
        root: Option<&'a ReferenceCounter<Node<K, V>>>,
        position: Position<&K>,
        inclusive: bool,
        offset: isize,
        comparator: &C,
    ) -> Self {
        let walk = walk_to_boundary(root, position, inclusive, comparator);
        let start = clamp_rank(walk.rank.saturating_add(offset), count(root));
        Self::resumed(root, &walk, Direction::Ascending, start)
    }

    /// Descends from the entry `offset` ranks away from the boundary.
    ///
    /// An offset running off the back starts at the last entry; one running
    /// off the front yields nothing.
    pub(super) fn keyed_descending<C: Comparator<K>>(
        root: Option<&'a ReferenceCounter<Node<K, V>>>,
        position: Position<&K>,
        inclusive: bool,
        offset: isize,
        comparator: &C,
    ) -> Self {
        let total = count(root);
        let walk = walk_to_boundary(root, position, inclusive, comparator);
        let rank = walk.rank.saturating_add(offset);
        if rank < 0 || total == 0 {
            return Self::empty();
        }
        Self::resumed(root, &walk, Direction::Descending, clamp_rank(rank, total - 1))
    }

    fn starting_at(root: Option<&'a ReferenceCounter<Node<K, V>>>, direction: Direction, start: usize) -> Self {
        let total = count(root);
        if start >= total {
            return Self::empty();
        }
        let mut entries = Self::positioned(direction, total, start);
        entries.seek(root.map(|node| &**node), start);
        entries
    }

    /// Seeks to `start` from the deepest node of `walk` whose subtree holds
    /// it. Ancestors above that node that the iterator has yet to visit are
    /// taken from the walk, so the tree is descended only once.
    fn resumed(
        root: Option<&'a ReferenceCounter<Node<K, V>>>,
        walk: &BoundaryWalk<'a, K, V>,
        direction: Direction,
        start: usize,
    ) -> Self {
        let Some((depth, index)) = walk.deepest_holding(start) else {
            return Self::starting_at(root, direction, start);
        };
        let mut entries = Self::positioned(direction, count(root), start);
        let pending = direction == Direction::Ascending;
        for visit in &walk.visits[..depth] {
            if visit.went_left == pending {
                entries.stack.push(visit.node);
            }
        }
        entries.seek(Some(walk.visits[depth].node), index);
        entries
    }

    fn positioned(direction: Direction, total: usize, start: usize) -> Self {
        let remaining = match direction {
            Direction::Ascending => total - start,
            Direction::Descending => start + 1,
        };
        Self {
            stack: SmallVec::new(),
            direction,
            remaining,
        }
    }

    /// Descends from `node` to the entry at `index` within its subtree,
    /// stacking the nodes that come after it in iteration order.
    fn seek(&mut self, mut link: Option<&'a Node<K, V>>, mut index: usize) {
        while let Some(node) = link {
            let left = count(node.left.as_ref());
            match index.cmp(&left) {
                Ordering::Less => {
                    if self.direction == Direction::Ascending {
                        self.stack.push(node);
                    }
                    link = node.left.as_deref();
                }
                Ordering::Equal => {
                    self.stack.push(node);
                    return;
                }
                Ordering::Greater => {
                    if self.direction == Direction::Descending {
                        self.stack.push(node);
                    }
                    index -= left + 1;
                    link = node.right.as_deref();
                }
            }
        }
    }

    /// Stops the iterator after at most `limit` more entries.
    #[must_use]
    pub(super) fn limited(mut self, limit: usize) -> Self {
        self.remaining = self.remaining.min(limit);
        self
    }

    fn push_spine(&mut self, mut link: Option<&'a ReferenceCounter<Node<K, V>>>) {
        while let Some(node) = link {
            self.stack.push(&**node);
            link = match self.direction {
                Direction::Ascending => node.left.as_ref(),
                Direction::Descending => node.right.as_ref(),
            };
        }
    }
}

/// Clamps a signed rank into `0..=upper`.
pub(super) fn clamp_rank(rank: isize, upper: usize) -> usize {
    if rank <= 0 {
        0
    } else if rank >= signed(upper) {
        upper
    } else {
        rank.unsigned_abs()
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.stack.pop()?;
        self.remaining -= 1;
        let next = match self.direction {
            Direction::Ascending => node.right.as_ref(),
            Direction::Descending => node.left.as_ref(),
        };
        self.push_spine(next);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Entries<'_, K, V> {}

impl<K, V> Clone for Entries<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            direction: self.direction,
            remaining: self.remaining,
        }
    }
}

impl<K, V> fmt::Debug for Entries<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Entries")
            .field("direction", &self.direction)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

//! Node shape, subtree counts, and the clone-on-write path.
//!
//! A node reachable from a published map is never written again. Mutations
//! copy the root-to-target path into a [`ClonedPath`] of owned nodes, rework
//! those copies (recolouring, rotating, recounting), and only then seal them
//! back into reference-counted nodes.

use smallvec::SmallVec;

use super::ReferenceCounter;

/// Inline capacity of path stacks. A red-black tree of height 48 holds more
/// than sixteen million entries; deeper paths spill to the heap.
pub(super) const PATH_CAPACITY: usize = 48;

// =============================================================================
// Color and Side
// =============================================================================

/// The color of a red-black tree node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum Color {
    Red,
    Black,
}

/// Which child of a node a path continues through.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum Side {
    Left,
    Right,
}

impl Side {
    pub(super) const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// A shared, possibly empty, subtree.
pub(super) type Link<K, V> = Option<ReferenceCounter<Node<K, V>>>;

/// Internal node structure. `count` is the size of the subtree rooted here.
#[derive(Clone, Debug)]
pub(super) struct Node<K, V> {
    pub(super) key: K,
    pub(super) value: V,
    pub(super) color: Color,
    pub(super) count: usize,
    pub(super) left: Link<K, V>,
    pub(super) right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Creates a new red leaf.
    pub(super) const fn new_red(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            count: 1,
            left: None,
            right: None,
        }
    }

    pub(super) fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    pub(super) const fn child(&self, side: Side) -> &Link<K, V> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(super) fn child_mut(&mut self, side: Side) -> &mut Link<K, V> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub(super) fn take_child(&mut self, side: Side) -> Link<K, V> {
        self.child_mut(side).take()
    }

    /// Recomputes `count` from the two child links.
    pub(super) fn recount(&mut self) {
        self.count = 1 + count(self.left.as_ref()) + count(self.right.as_ref());
    }

    /// Creates a copy of this node with a new color.
    pub(super) fn with_color(&self, color: Color) -> Self
    where
        K: Clone,
        V: Clone,
    {
        Self {
            color,
            ..self.clone()
        }
    }
}

/// Size of an optional subtree.
#[inline]
pub(super) fn count<K, V>(link: Option<&ReferenceCounter<Node<K, V>>>) -> usize {
    link.map_or(0, |node| node.count)
}

/// Helper function to check if an optional node is red.
#[inline]
pub(super) fn is_red<K, V>(link: Option<&ReferenceCounter<Node<K, V>>>) -> bool {
    link.is_some_and(|node| node.is_red())
}

// =============================================================================
// ClonedPath
// =============================================================================

/// A root-to-target path of freshly copied, exclusively owned nodes.
///
/// `nodes[i + 1]` is the pending child of `nodes[i]` on side `sides[i]`; the
/// link slot itself holds `None` until [`ClonedPath::seal`] reattaches it.
/// When `sides` is as long as `nodes`, the deepest node's pending child is
/// genuinely empty.
pub(super) struct ClonedPath<K, V> {
    nodes: Vec<Node<K, V>>,
    sides: SmallVec<[Side; PATH_CAPACITY]>,
}

impl<K: Clone, V: Clone> ClonedPath<K, V> {
    /// Copies every node on `nodes`, detaching the child each step continues through.
    pub(super) fn copy(nodes: &[&Node<K, V>], sides: &[Side]) -> Self {
        let copies = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let mut copy = (*node).clone();
                if let Some(&side) = sides.get(index) {
                    copy.child_mut(side).take();
                }
                copy
            })
            .collect();
        Self {
            nodes: copies,
            sides: SmallVec::from_slice(sides),
        }
    }
}

impl<K, V> ClonedPath<K, V> {
    pub(super) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn node(&self, index: usize) -> &Node<K, V> {
        &self.nodes[index]
    }

    pub(super) fn node_mut(&mut self, index: usize) -> &mut Node<K, V> {
        &mut self.nodes[index]
    }

    /// The side of `nodes[index]` its pending child hangs from.
    pub(super) fn side(&self, index: usize) -> Side {
        self.sides[index]
    }

    /// Appends a node below the deepest one, on the side already recorded for it.
    pub(super) fn push(&mut self, node: Node<K, V>) {
        debug_assert_eq!(self.sides.len(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Appends a node below the deepest one, on `side`.
    pub(super) fn push_on(&mut self, side: Side, node: Node<K, V>) {
        debug_assert_eq!(self.sides.len() + 1, self.nodes.len());
        self.sides.push(side);
        self.nodes.push(node);
    }

    /// Removes the deepest node, leaving an empty pending slot in its parent.
    pub(super) fn pop(&mut self) -> Option<Node<K, V>> {
        self.nodes.pop()
    }

    /// Removes the node at `index`, shifting its pending child into its place.
    pub(super) fn remove(&mut self, index: usize) -> Node<K, V> {
        self.sides.remove(index);
        self.nodes.remove(index)
    }

    /// Inserts `node` at `index` so that the node previously there becomes its
    /// pending child on `side`.
    pub(super) fn insert(&mut self, index: usize, node: Node<K, V>, side: Side) {
        self.nodes.insert(index, node);
        self.sides.insert(index, side);
    }

    /// The side of `nodes[index]` a pending node hangs from, if any.
    pub(super) fn pending_side(&self, index: usize) -> Option<Side> {
        (index + 1 < self.nodes.len()).then(|| self.sides[index])
    }

    /// Size of the pending child of `nodes[index]`.
    pub(super) fn pending_count(&self, index: usize) -> usize {
        self.nodes.get(index + 1).map_or(0, |node| node.count)
    }

    /// Recomputes the count of `nodes[index]`, including its pending child.
    pub(super) fn recount(&mut self, index: usize) {
        let pending = self.pending_count(index);
        let node = &mut self.nodes[index];
        node.recount();
        node.count += pending;
    }

    /// Increments the count of every node above `end`.
    pub(super) fn grow_counts(&mut self, end: usize) {
        for node in &mut self.nodes[..end] {
            node.count += 1;
        }
    }

    /// Decrements the count of every node above `end`.
    pub(super) fn shrink_counts(&mut self, end: usize) {
        for node in &mut self.nodes[..end] {
            node.count -= 1;
        }
    }

    /// Swaps key and value between two nodes of the path.
    pub(super) fn swap_entries(&mut self, upper: usize, lower: usize) {
        debug_assert!(upper < lower);
        let (head, tail) = self.nodes.split_at_mut(lower);
        std::mem::swap(&mut head[upper].key, &mut tail[0].key);
        std::mem::swap(&mut head[upper].value, &mut tail[0].value);
    }

    pub(super) fn make_root_black(&mut self) {
        if let Some(root) = self.nodes.first_mut() {
            root.color = Color::Black;
        }
    }

    /// Reattaches every pending child bottom-up and returns the new root.
    pub(super) fn seal(self) -> Link<K, V> {
        let Self { mut nodes, sides } = self;
        let mut sealed: Link<K, V> = None;
        while let Some(mut node) = nodes.pop() {
            if let Some(child) = sealed.take() {
                *node.child_mut(sides[nodes.len()]) = Some(child);
            }
            sealed = Some(ReferenceCounter::new(node));
        }
        sealed
    }
}

// =============================================================================
// Invariant Checking
// =============================================================================

#[cfg(any(test, feature = "testing"))]
pub(super) fn check_subtree<K, V>(
    link: Option<&ReferenceCounter<Node<K, V>>>,
    first_index: usize,
) -> Result<(usize, usize), crate::error::InvariantViolation> {
    use crate::error::InvariantViolation;

    let Some(node) = link else {
        return Ok((1, 0));
    };
    let (left_black, left_size) = check_subtree(node.left.as_ref(), first_index)?;
    let index = first_index + left_size;
    if node.is_red() && (is_red(node.left.as_ref()) || is_red(node.right.as_ref())) {
        return Err(InvariantViolation::RedRed { index });
    }
    let (right_black, right_size) = check_subtree(node.right.as_ref(), index + 1)?;
    if left_black != right_black {
        return Err(InvariantViolation::BlackHeight {
            index,
            left: left_black,
            right: right_black,
        });
    }
    let actual = left_size + right_size + 1;
    if node.count != actual {
        return Err(InvariantViolation::Count {
            index,
            recorded: node.count,
            actual,
        });
    }
    Ok((left_black + usize::from(!node.is_red()), actual))
}

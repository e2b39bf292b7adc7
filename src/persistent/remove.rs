//! Path-copying deletion.
//!
//! The path to the doomed node is copied. A node with two children first
//! trades its entry with its in-order predecessor, so the node actually
//! unlinked has at most one child. Removing a red leaf or a black node with a
//! single (red) child never disturbs black heights; removing a black leaf
//! leaves its parent one black short on that side, which
//! [`fix_double_black`] repairs on the way up.

use super::ReferenceCounter;
use super::node::{ClonedPath, Color, Link, Node, Side, is_red};
use super::search::SearchPath;

/// Removes the node the search path ends at and returns the new root.
pub(super) fn remove<K: Clone, V: Clone>(search: &SearchPath<'_, K, V>) -> Link<K, V> {
    let mut path = ClonedPath::copy(&search.nodes, &search.sides);
    let target = path.len() - 1;

    let doomed = path.node(target);
    if doomed.left.is_some() && doomed.right.is_some() {
        descend_to_predecessor(&mut path, target);
        path.swap_entries(target, path.len() - 1);
    }

    let last = path.len() - 1;
    let doomed = path.node(last);

    if doomed.is_red() {
        // A red node with at most one child is a leaf.
        path.pop();
        path.shrink_counts(last);
        return path.seal();
    }

    if let Some(child) = doomed.left.as_ref().or(doomed.right.as_ref()) {
        // The lone child of a black node is a red leaf; it takes the node's place.
        let replacement = child.with_color(Color::Black);
        path.pop();
        path.push(replacement);
        path.shrink_counts(last);
        path.make_root_black();
        return path.seal();
    }

    if last == 0 {
        return None;
    }

    path.pop();
    path.shrink_counts(last);
    fix_double_black(&mut path);
    path.make_root_black();
    path.seal()
}

/// Extends the path from `target` to the rightmost node of its left subtree.
fn descend_to_predecessor<K: Clone, V: Clone>(path: &mut ClonedPath<K, V>, target: usize) {
    let mut side = Side::Left;
    let mut next = path.node_mut(target).take_child(side);
    while let Some(node) = next {
        let mut copy = (*node).clone();
        next = copy.take_child(Side::Right);
        path.push_on(side, copy);
        side = Side::Right;
    }
}

/// Restores black heights after a black leaf was unlinked from the deepest
/// node of `path`.
///
/// The short subtree is always the pending child of `path.node(parent)`.
/// Each step either ends the cascade with a rotation or recolouring, or, when
/// parent and sibling are both black with black nephews, moves the deficit
/// one level up. A red sibling is first rotated above the parent so the
/// deficit is met by a black sibling one level lower.
pub(super) fn fix_double_black<K: Clone, V: Clone>(path: &mut ClonedPath<K, V>) {
    let mut parent = path.len() - 1;
    loop {
        let short = path.side(parent);
        let far = short.opposite();
        let Some(sibling) = path.node(parent).child(far).clone() else {
            break;
        };

        if is_red(sibling.child(far).as_ref()) {
            // Far nephew red: lift the sibling, the far nephew turns black.
            let mut lifted = (*sibling).clone();
            let far_nephew = lifted
                .child(far)
                .as_ref()
                .map(|nephew| ReferenceCounter::new(nephew.with_color(Color::Black)));
            *lifted.child_mut(far) = far_nephew;
            *path.node_mut(parent).child_mut(far) = lifted.take_child(short);
            lifted.color = path.node(parent).color;
            path.node_mut(parent).color = Color::Black;
            lift_above(path, parent, lifted, short);
            return;
        }

        if let Some(near_nephew) = sibling.child(short).as_ref().filter(|nephew| nephew.is_red()) {
            // Near nephew red: it rises above both parent and sibling.
            let mut rotated = (*sibling).clone();
            let mut lifted = (**near_nephew).clone();
            *rotated.child_mut(short) = lifted.take_child(far);
            *path.node_mut(parent).child_mut(far) = lifted.take_child(short);
            rotated.color = Color::Black;
            rotated.recount();
            *lifted.child_mut(far) = Some(ReferenceCounter::new(rotated));
            lifted.color = path.node(parent).color;
            path.node_mut(parent).color = Color::Black;
            lift_above(path, parent, lifted, short);
            return;
        }

        if sibling.is_red() {
            // Red sibling: rotate it above the parent, then retry one level down.
            let mut lifted = (*sibling).clone();
            *path.node_mut(parent).child_mut(far) = lifted.take_child(short);
            lifted.color = path.node(parent).color;
            path.node_mut(parent).color = Color::Red;
            lift_above(path, parent, lifted, short);
            parent += 1;
            continue;
        }

        // Black sibling, black nephews: paint the sibling red.
        *path.node_mut(parent).child_mut(far) =
            Some(ReferenceCounter::new(sibling.with_color(Color::Red)));
        if path.node(parent).is_red() {
            path.node_mut(parent).color = Color::Black;
            return;
        }
        if parent == 0 {
            return;
        }
        parent -= 1;
    }
}

/// Places `lifted` where `path.node(index)` was, with that node as its
/// pending child on `side`, and recounts both.
fn lift_above<K, V>(
    path: &mut ClonedPath<K, V>,
    index: usize,
    lifted: Node<K, V>,
    side: Side,
) {
    path.insert(index, lifted, side);
    path.recount(index + 1);
    path.recount(index);
}

//! Error types for ranked map operations.

use thiserror::Error;

/// Errors returned by the position-accepting map operations.
///
/// Absent keys, empty ranges and rank overflow are not errors; they surface as
/// `None`, an unchanged map, an empty iterator, or a sentinel position.
///
/// # Examples
///
/// ```rust
/// use rankmap::{PersistentRankedMap, Position, RankedMapError};
///
/// let map = PersistentRankedMap::new().set(1, "one");
/// assert_eq!(
///     map.try_get(Position::BeforeStart),
///     Err(RankedMapError::InvalidKey { sentinel: "before start" })
/// );
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankedMapError {
    /// A boundary sentinel was passed where a real key is required.
    #[error("invalid key: {sentinel} is a boundary sentinel, not a key")]
    InvalidKey {
        /// Which sentinel was passed.
        sentinel: &'static str,
    },
}

impl RankedMapError {
    /// Check if this error was caused by a sentinel used as a key.
    pub const fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }
}

/// A broken structural invariant, reported by `PersistentRankedMap::validate`.
#[cfg(any(test, feature = "testing"))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The root node is red.
    #[error("root node is red")]
    RedRoot,
    /// A red node has a red child.
    #[error("red node at in-order index {index} has a red child")]
    RedRed {
        /// In-order index of the offending parent.
        index: usize,
    },
    /// Two root-to-leaf paths carry different numbers of black nodes.
    #[error("black height mismatch below in-order index {index}: left {left}, right {right}")]
    BlackHeight {
        /// In-order index of the node whose subtrees disagree.
        index: usize,
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// A node's stored subtree size is wrong.
    #[error("node at in-order index {index} records count {recorded}, actual {actual}")]
    Count {
        /// In-order index of the node.
        index: usize,
        /// The stored count.
        recorded: usize,
        /// The computed subtree size.
        actual: usize,
    },
    /// In-order keys are not strictly increasing.
    #[error("keys out of order at in-order index {index}")]
    Order {
        /// In-order index of the first out-of-order key.
        index: usize,
    },
}

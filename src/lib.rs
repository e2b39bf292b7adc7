//! # rankmap
//!
//! A persistent (immutable, structurally shared) ordered map whose nodes carry
//! subtree sizes, so entries can be addressed both by key and by rank offset
//! relative to a key.
//!
//! ## Overview
//!
//! - **Persistent**: `set`, `clear` and `clear_range` return a new map and leave
//!   every earlier version untouched. Unmodified subtrees are shared.
//! - **Ordered by a comparator**: keys are ordered by a [`Comparator`], which
//!   defaults to the key's `Ord` implementation.
//! - **Rank-aware**: "the key three positions after this one" is an O(log N)
//!   query, and iteration can start at any rank-adjusted boundary.
//! - **Boundary sentinels**: [`Position::BeforeStart`] and [`Position::AfterEnd`]
//!   address the virtual slots outside the key range.
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes through `std::sync::Arc`, making maps
//!   `Send + Sync`. Without it `std::rc::Rc` is used.
//! - `testing`: exposes `PersistentRankedMap::validate` for invariant checks.
//!
//! ## Example
//!
//! ```rust
//! use rankmap::prelude::*;
//!
//! let map: PersistentRankedMap<i32, &str> =
//!     [(1, "a"), (2, "b"), (3, "c"), (5, "e"), (8, "h")].into_iter().collect();
//!
//! // The first key not before 4, and the one after it.
//! assert_eq!(map.get_key(Position::Key(&4), false, 1), Position::Key(&5));
//! assert_eq!(map.get_key(Position::Key(&4), false, 2), Position::Key(&8));
//!
//! // Walking off the front collapses to the sentinel.
//! assert_eq!(map.get_key(Position::Key(&4), false, -10), Position::BeforeStart);
//!
//! // Older versions are never modified.
//! let smaller = map.clear_range(Position::Key(&2), Position::Key(&5));
//! assert_eq!(smaller.len(), 3);
//! assert_eq!(map.len(), 5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use rankmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::comparator::*;
    pub use crate::error::*;
    pub use crate::persistent::*;
    pub use crate::position::*;
}

pub mod comparator;
pub mod error;
pub mod persistent;
pub mod position;

pub use comparator::{Comparator, NaturalOrder, Reverse};
pub use error::RankedMapError;
pub use persistent::{Boundary, Entries, PersistentRankedMap, RangeOptions};
pub use position::Position;

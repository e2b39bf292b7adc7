//! Persistent rank-augmented red-black map.
//!
//! The map is split into the engines it is made of:
//!
//! - `node`: the immutable node shape and the subtree-size bookkeeping
//! - `search`: exact lookup and the root-to-target paths used by mutations
//! - `insert`: path-copying insertion with red-black fix-up
//! - `remove`: path-copying deletion with the double-black cascade
//! - `rank`: offset navigation over subtree counts
//! - `iter`: lazy, explicit-stack, rank-seeking iterators
//! - `ranked_map`: the public [`PersistentRankedMap`] facade
//!
//! # Structural Sharing
//!
//! A mutation clones only the nodes on the path from the root to the change
//! (plus the handful touched by rotations). Everything else is shared with the
//! previous version, which stays valid and unchanged.
//!
//! ```rust
//! use rankmap::persistent::PersistentRankedMap;
//!
//! let map: PersistentRankedMap<i32, i32> = (0..100).map(|key| (key, key * 2)).collect();
//! let updated = map.set(50, 999);
//!
//! assert_eq!(map.get(&50), Some(&100));      // Original unchanged
//! assert_eq!(updated.get(&50), Some(&999));  // New version
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (the default), this is `std::sync::Arc`,
/// which lets map versions be shared between threads.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod insert;
mod iter;
mod node;
mod rank;
mod ranked_map;
mod remove;
mod search;

pub use iter::Entries;
pub use ranked_map::{Boundary, PersistentRankedMap, RangeOptions};

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentRankedMap<i32, String>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(Entries<'static, i32, String>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentRankedMap<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

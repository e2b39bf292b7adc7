//! Key ordering used by [`PersistentRankedMap`](crate::PersistentRankedMap).
//!
//! A map is built with one comparator and keeps it for every version derived
//! from it. The comparator must define a strict total order and must stay
//! consistent across the whole lineage of maps.
//!
//! Closures of the shape `Fn(&K, &K) -> Ordering` are comparators:
//!
//! ```rust
//! use rankmap::PersistentRankedMap;
//!
//! let by_length = |left: &String, right: &String| {
//!     left.len().cmp(&right.len()).then_with(|| left.cmp(right))
//! };
//! let map = PersistentRankedMap::with_comparator(by_length)
//!     .set("ccc".to_string(), 3)
//!     .set("a".to_string(), 1)
//!     .set("bb".to_string(), 2);
//!
//! let keys: Vec<&String> = map.keys().collect();
//! assert_eq!(keys, vec!["a", "bb", "ccc"]);
//! ```

use std::cmp::Ordering;

/// A total order over keys of type `K`.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, left: &K, right: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

/// Reverses the order of the wrapped comparator.
///
/// # Examples
///
/// ```rust
/// use rankmap::{NaturalOrder, PersistentRankedMap, Reverse};
///
/// let map = PersistentRankedMap::with_comparator(Reverse(NaturalOrder))
///     .set(1, "one")
///     .set(3, "three")
///     .set(2, "two");
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&3, &2, &1]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reverse<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reverse<C> {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self.0.compare(right, left)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self(left, right)
    }
}

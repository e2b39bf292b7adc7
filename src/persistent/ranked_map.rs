//! The public persistent ranked map.
//!
//! [`PersistentRankedMap`] ties the engines together: lookups go through
//! `search`, rank queries through `rank`, mutations through `insert` and
//! `remove`, and every sequence it hands out is an [`Entries`] iterator.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::ReferenceCounter;
use super::insert::{insert, replace_value};
use super::iter::{Entries, clamp_rank};
use super::node::{Link, count};
use super::rank::{Seek, backward_offset, boundary_rank, find_node, forward_offset, signed};
use super::remove::remove;
use super::search::{Descent, descend, first_not_before, locate, path_to_equal};
use crate::comparator::{Comparator, NaturalOrder};
use crate::error::RankedMapError;
use crate::position::Position;

// =============================================================================
// PersistentRankedMap Definition
// =============================================================================

/// A persistent (immutable) ordered map with rank addressing.
///
/// Entries are kept in the order defined by the map's [`Comparator`]. Every
/// node records the size of its subtree, so besides looking up a key the map
/// can answer "which key lies `n` positions after this boundary" and start an
/// iterator at such a rank in O(log N).
///
/// `set`, `clear` and `clear_range` return a new map. The receiver, and every
/// map derived from it earlier, stays exactly as it was; unmodified subtrees
/// are shared between versions.
///
/// # Time Complexity
///
/// | Operation              | Complexity        |
/// |------------------------|-------------------|
/// | `new`                  | O(1)              |
/// | `len` / `is_empty`     | O(1)              |
/// | `get` / `contains_key` | O(log N)          |
/// | `get_key`              | O(log N)          |
/// | `get_index`            | O(log N)          |
/// | `set` / `clear`        | O(log N)          |
/// | `clear_range`          | O(k log N)        |
/// | iterator seek          | O(log N)          |
/// | iterator step          | O(1) amortized    |
///
/// # Examples
///
/// ```rust
/// use rankmap::{PersistentRankedMap, Position};
///
/// let map = PersistentRankedMap::new()
///     .set(10, "ten")
///     .set(20, "twenty")
///     .set(30, "thirty")
///     .set(40, "forty");
///
/// let trimmed = map.clear_range(Position::Key(&20), Position::Key(&40));
/// let keys: Vec<&i32> = trimmed.keys().collect();
/// assert_eq!(keys, vec![&10, &40]);
///
/// // The original is unchanged.
/// assert_eq!(map.len(), 4);
/// ```
pub struct PersistentRankedMap<K, V, C = NaturalOrder> {
    /// Root node of the tree
    root: Link<K, V>,
    /// Shared by every version derived from this map
    comparator: ReferenceCounter<C>,
}

impl<K, V> PersistentRankedMap<K, V, NaturalOrder> {
    /// Creates a new empty map ordered by the key's [`Ord`] implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map: PersistentRankedMap<i32, String> = PersistentRankedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> PersistentRankedMap<K, V, C> {
    /// Creates a new empty map ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map = PersistentRankedMap::with_comparator(|left: &i32, right: &i32| right.cmp(left))
    ///     .set(1, 'a')
    ///     .set(2, 'b');
    /// assert_eq!(map.first(), Some((&2, &'b')));
    /// ```
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            comparator: ReferenceCounter::new(comparator),
        }
    }

    fn from_root(&self, root: Link<K, V>) -> Self {
        Self {
            root,
            comparator: ReferenceCounter::clone(&self.comparator),
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        count(self.root.as_ref())
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the comparator the map is ordered by.
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns `true` when both maps share the same tree.
    ///
    /// Operations that leave a map unchanged (clearing an absent key, clearing
    /// an empty range) return a map for which this holds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map = PersistentRankedMap::new().set(1, "one");
    /// assert!(map.clear(&2).ptr_eq(&map));
    /// assert!(!map.clear(&1).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the entry at zero-based rank `index`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map: PersistentRankedMap<i32, char> = [(5, 'e'), (1, 'a'), (3, 'c')].into_iter().collect();
    /// assert_eq!(map.get_index(1), Some((&3, &'c')));
    /// assert_eq!(map.get_index(3), None);
    /// ```
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        match forward_offset(self.root.as_ref(), signed(index).saturating_add(1)) {
            Seek::Found(node) => Some((&node.key, &node.value)),
            Seek::Overflow(_) => None,
        }
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.get_index(0)
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        match backward_offset(self.root.as_ref(), -1) {
            Seek::Found(node) => Some((&node.key, &node.value)),
            Seek::Overflow(_) => None,
        }
    }

    /// Returns every entry in ascending order, or descending when `reverse`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map = PersistentRankedMap::new().set(5, "e").set(1, "a").set(3, "c");
    ///
    /// let ascending: Vec<(&i32, &&str)> = map.entries(false).collect();
    /// assert_eq!(ascending, vec![(&1, &"a"), (&3, &"c"), (&5, &"e")]);
    ///
    /// let descending: Vec<(&i32, &&str)> = map.entries(true).collect();
    /// assert_eq!(descending, vec![(&5, &"e"), (&3, &"c"), (&1, &"a")]);
    /// ```
    #[must_use]
    pub fn entries(&self, reverse: bool) -> Entries<'_, K, V> {
        if reverse {
            Entries::descending(self.root.as_ref())
        } else {
            Entries::ascending(self.root.as_ref())
        }
    }

    /// Returns every entry in ascending order.
    #[must_use]
    pub fn iter(&self) -> Entries<'_, K, V> {
        Entries::ascending(self.root.as_ref())
    }

    /// Returns every key in ascending order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns every value in ascending key order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

// =============================================================================
// Lookups and Rank Queries
// =============================================================================

impl<K, V, C: Comparator<K>> PersistentRankedMap<K, V, C> {
    /// Returns a reference to the value stored under `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let map = PersistentRankedMap::new().set("hello", 42);
    /// assert_eq!(map.get(&"hello"), Some(&42));
    /// assert_eq!(map.get(&"world"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        locate(self.root.as_ref(), key, &*self.comparator).map(|node| &node.value)
    }

    /// Returns `true` if the map holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        locate(self.root.as_ref(), key, &*self.comparator).is_some()
    }

    /// Like [`get`](Self::get), for callers holding a [`Position`].
    ///
    /// # Errors
    ///
    /// Returns [`RankedMapError::InvalidKey`] when `key` is a sentinel.
    pub fn try_get(&self, key: Position<&K>) -> Result<Option<&V>, RankedMapError> {
        let key = key.into_key().inspect_err(|error| {
            tracing::debug!(%error, "rejected sentinel lookup");
        })?;
        Ok(self.get(key))
    }

    /// Returns the key `offset` ranks away from a boundary.
    ///
    /// The boundary sits just before the first key not before `position`:
    /// keys comparing less than `position` are before it, and with
    /// `inclusive` so are keys comparing equal. An `offset` of 1 addresses the
    /// first key after the boundary, 2 the next, 0 the last key before it, and
    /// so on. [`Position::BeforeStart`] puts the boundary in front of every
    /// key, [`Position::AfterEnd`] behind every key.
    ///
    /// When the addressed rank falls outside the map the matching sentinel is
    /// returned.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{PersistentRankedMap, Position};
    ///
    /// let map: PersistentRankedMap<i32, ()> = [1, 2, 3, 5, 8].into_iter().map(|key| (key, ())).collect();
    ///
    /// assert_eq!(map.get_key(Position::Key(&4), false, 1), Position::Key(&5));
    /// assert_eq!(map.get_key(Position::Key(&5), true, 1), Position::Key(&8));
    /// assert_eq!(map.get_key(Position::Key(&4), false, 0), Position::Key(&3));
    /// assert_eq!(map.get_key(Position::Key(&4), false, 3), Position::AfterEnd);
    /// assert_eq!(map.get_key(Position::AfterEnd, false, -1), Position::Key(&8));
    /// ```
    #[must_use]
    pub fn get_key(&self, position: Position<&K>, inclusive: bool, offset: isize) -> Position<&K> {
        find_node(self.root.as_ref(), position, inclusive, offset, &*self.comparator).into_position()
    }

    /// Returns the number of keys strictly before `key`.
    ///
    /// For a present key this is its zero-based rank.
    #[must_use]
    pub fn rank_of(&self, key: &K) -> usize {
        let before = boundary_rank(self.root.as_ref(), Position::Key(key), false, &*self.comparator);
        before.saturating_add(1).unsigned_abs()
    }

    /// Iterates in ascending order from the entry [`get_key`](Self::get_key)
    /// would address, to the end of the map.
    ///
    /// A start rank before the first entry starts at the first entry; one after
    /// the last yields nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{PersistentRankedMap, Position};
    ///
    /// let map: PersistentRankedMap<i32, ()> = [1, 2, 3, 5, 8].into_iter().map(|key| (key, ())).collect();
    /// let keys: Vec<&i32> = map.forward_iter(Position::Key(&3), false, 0).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&2, &3, &5, &8]);
    /// ```
    #[must_use]
    pub fn forward_iter(&self, position: Position<&K>, inclusive: bool, offset: isize) -> Entries<'_, K, V> {
        Entries::keyed_ascending(self.root.as_ref(), position, inclusive, offset, &*self.comparator)
    }

    /// Iterates in descending order from the entry [`get_key`](Self::get_key)
    /// would address, to the start of the map.
    ///
    /// A start rank after the last entry starts at the last entry; one before
    /// the first yields nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{PersistentRankedMap, Position};
    ///
    /// let map: PersistentRankedMap<i32, ()> = [1, 2, 3, 5, 8].into_iter().map(|key| (key, ())).collect();
    /// let keys: Vec<&i32> = map.backward_iter(Position::Key(&4), false, 0).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn backward_iter(&self, position: Position<&K>, inclusive: bool, offset: isize) -> Entries<'_, K, V> {
        Entries::keyed_descending(self.root.as_ref(), position, inclusive, offset, &*self.comparator)
    }

    /// Iterates over the entries whose rank lies between two boundaries.
    ///
    /// Each [`Boundary`] resolves to a rank the way [`get_key`](Self::get_key)
    /// does. The entries from the start rank up to, but excluding, the end
    /// rank are yielded, clamped to the map. With `options.reverse` the same
    /// entries come in descending order. `options.limit` caps how many are
    /// yielded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{Boundary, PersistentRankedMap, Position, RangeOptions};
    ///
    /// let map: PersistentRankedMap<i32, ()> = (1..=9).map(|key| (key, ())).collect();
    ///
    /// let keys: Vec<&i32> = map
    ///     .get_range(Boundary::key(&3), Boundary::key(&7), RangeOptions::default())
    ///     .map(|(key, _)| key)
    ///     .collect();
    /// assert_eq!(keys, vec![&3, &4, &5, &6]);
    ///
    /// let options = RangeOptions { limit: Some(2), reverse: true };
    /// let keys: Vec<&i32> = map
    ///     .get_range(Boundary::before_start(), Boundary::key(&7).inclusive(true), options)
    ///     .map(|(key, _)| key)
    ///     .collect();
    /// assert_eq!(keys, vec![&7, &6]);
    /// ```
    #[must_use]
    pub fn get_range(&self, start: Boundary<'_, K>, end: Boundary<'_, K>, options: RangeOptions) -> Entries<'_, K, V> {
        let total = self.len();
        let first = clamp_rank(self.resolve(start), total);
        let past = clamp_rank(self.resolve(end), total);
        if first >= past {
            return Entries::empty();
        }

        let entries = if options.reverse {
            Entries::descending_from(self.root.as_ref(), past - 1)
        } else {
            Entries::ascending_from(self.root.as_ref(), first)
        };
        let entries = entries.limited(past - first);
        match options.limit {
            Some(limit) => entries.limited(limit),
            None => entries,
        }
    }

    fn resolve(&self, boundary: Boundary<'_, K>) -> isize {
        boundary_rank(self.root.as_ref(), boundary.position, boundary.inclusive, &*self.comparator)
            .saturating_add(boundary.offset)
    }

    /// Checks every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`](crate::error::InvariantViolation)
    /// found: a red root, a red node with a red child, unequal black heights,
    /// a wrong subtree count, or keys out of comparator order.
    #[cfg(any(test, feature = "testing"))]
    pub fn validate(&self) -> Result<(), crate::error::InvariantViolation> {
        use super::node::{check_subtree, is_red};
        use crate::error::InvariantViolation;

        if is_red(self.root.as_ref()) {
            return Err(InvariantViolation::RedRoot);
        }
        check_subtree(self.root.as_ref(), 0)?;

        let mut keys = self.keys();
        if let Some(mut previous) = keys.next() {
            for (index, key) in keys.enumerate() {
                if self.comparator.compare(previous, key).is_ge() {
                    return Err(InvariantViolation::Order { index: index + 1 });
                }
                previous = key;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Mutations
// =============================================================================

impl<K: Clone, V: Clone, C: Comparator<K>> PersistentRankedMap<K, V, C> {
    /// Returns a new map with `key` bound to `value`.
    ///
    /// An existing entry for `key` has its value replaced; every other entry
    /// is unchanged.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::PersistentRankedMap;
    ///
    /// let first = PersistentRankedMap::new().set(1, "one");
    /// let second = first.set(1, "uno").set(2, "two");
    ///
    /// assert_eq!(first.get(&1), Some(&"one"));
    /// assert_eq!(second.get(&1), Some(&"uno"));
    /// assert_eq!(second.len(), 2);
    /// ```
    #[must_use]
    pub fn set(&self, key: K, value: V) -> Self {
        let descent = descend(self.root.as_ref(), &key, &*self.comparator);
        let root = match descent {
            Descent::Occupied(path) => replace_value(&path, value),
            Descent::Vacant(path) => insert(&path, key, value),
        };
        let map = self.from_root(root);
        tracing::trace!(length = map.len(), "set");
        map
    }

    /// Like [`set`](Self::set), for callers holding a [`Position`].
    ///
    /// # Errors
    ///
    /// Returns [`RankedMapError::InvalidKey`] when `key` is a sentinel; no new
    /// map is built.
    pub fn try_set(&self, key: Position<K>, value: V) -> Result<Self, RankedMapError> {
        let key = key.into_key().inspect_err(|error| {
            tracing::debug!(%error, "rejected sentinel insertion");
        })?;
        Ok(self.set(key, value))
    }

    /// Returns a new map without `key`.
    ///
    /// When `key` is absent the result shares this map's tree (see
    /// [`ptr_eq`](Self::ptr_eq)).
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn clear(&self, key: &K) -> Self {
        let Some(path) = path_to_equal(self.root.as_ref(), key, &*self.comparator) else {
            return self.clone();
        };
        let map = self.from_root(remove(&path));
        tracing::trace!(length = map.len(), "clear");
        map
    }

    /// Like [`clear`](Self::clear), for callers holding a [`Position`].
    ///
    /// # Errors
    ///
    /// Returns [`RankedMapError::InvalidKey`] when `key` is a sentinel.
    pub fn try_clear(&self, key: Position<&K>) -> Result<Self, RankedMapError> {
        let key = key.into_key().inspect_err(|error| {
            tracing::debug!(%error, "rejected sentinel removal");
        })?;
        Ok(self.clear(key))
    }

    /// Returns a new map without the keys in the half-open range
    /// `[start, end)`.
    ///
    /// [`Position::BeforeStart`] as `start` and [`Position::AfterEnd`] as `end`
    /// leave that side unbounded. An empty or inverted range returns a map
    /// sharing this map's tree.
    ///
    /// # Complexity
    ///
    /// O(k log N) for k removed entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{PersistentRankedMap, Position};
    ///
    /// let map: PersistentRankedMap<i32, ()> = (1..=6).map(|key| (key, ())).collect();
    ///
    /// let head = map.clear_range(Position::Key(&3), Position::AfterEnd);
    /// assert_eq!(head.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    ///
    /// let inverted = map.clear_range(Position::Key(&5), Position::Key(&2));
    /// assert!(inverted.ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn clear_range(&self, start: Position<&K>, end: Position<&K>) -> Self {
        if matches!(start, Position::AfterEnd) || matches!(end, Position::BeforeStart) {
            return self.clone();
        }

        let mut root = self.root.clone();
        let mut removed = 0_usize;
        loop {
            let next = {
                let path = first_not_before(root.as_ref(), start, &*self.comparator);
                let Some(target) = path.target() else {
                    break;
                };
                if let Position::Key(end) = end
                    && self.comparator.compare(&target.key, end).is_ge()
                {
                    break;
                }
                remove(&path)
            };
            root = next;
            removed += 1;
        }

        if removed == 0 {
            return self.clone();
        }
        let map = self.from_root(root);
        tracing::trace!(removed, length = map.len(), "clear_range");
        map
    }
}

// =============================================================================
// Range Parameters
// =============================================================================

/// One end of a [`get_range`](PersistentRankedMap::get_range) query.
///
/// A boundary resolves to a rank the way
/// [`get_key`](PersistentRankedMap::get_key) does: the rank just after the
/// boundary position, shifted by `offset - 1`. The default, `inclusive =
/// false` and `offset = 1`, addresses the first key not less than the
/// position.
#[derive(Debug, PartialEq, Eq)]
pub struct Boundary<'k, K> {
    /// Where the boundary sits.
    pub position: Position<&'k K>,
    /// Whether keys equal to `position` fall before the boundary.
    pub inclusive: bool,
    /// Rank shift applied after locating the boundary.
    pub offset: isize,
}

impl<'k, K> Boundary<'k, K> {
    /// A boundary at `position` with the default `inclusive` and `offset`.
    #[must_use]
    pub const fn new(position: Position<&'k K>) -> Self {
        Self {
            position,
            inclusive: false,
            offset: 1,
        }
    }

    /// A boundary at `key`.
    #[must_use]
    pub const fn key(key: &'k K) -> Self {
        Self::new(Position::Key(key))
    }

    /// A boundary in front of every key.
    #[must_use]
    pub const fn before_start() -> Self {
        Self::new(Position::BeforeStart)
    }

    /// A boundary behind every key.
    #[must_use]
    pub const fn after_end() -> Self {
        Self::new(Position::AfterEnd)
    }

    /// Sets whether keys equal to the position fall before the boundary.
    #[must_use]
    pub const fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Sets the rank shift.
    #[must_use]
    pub const fn offset(mut self, offset: isize) -> Self {
        self.offset = offset;
        self
    }
}

impl<K> Clone for Boundary<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Boundary<'_, K> {}

/// Options for [`get_range`](PersistentRankedMap::get_range).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeOptions {
    /// Maximum number of entries to yield.
    pub limit: Option<usize>,
    /// Yield entries in descending order.
    pub reverse: bool,
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C> Clone for PersistentRankedMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            comparator: ReferenceCounter::clone(&self.comparator),
        }
    }
}

impl<K, V, C: Default> Default for PersistentRankedMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Default> FromIterator<(K, V)> for PersistentRankedMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |map, (key, value)| map.set(key, value))
    }
}

impl<'a, K, V, C> IntoIterator for &'a PersistentRankedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Entries<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Maps are equal when they hold equal entries in the same order.
impl<K: PartialEq, V: PartialEq, C> PartialEq for PersistentRankedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq, C> Eq for PersistentRankedMap<K, V, C> {}

impl<K: Hash, V: Hash, C> Hash for PersistentRankedMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for PersistentRankedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for PersistentRankedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Reverse;
    use rstest::rstest;

    fn from_keys(keys: &[i32]) -> PersistentRankedMap<i32, i32> {
        keys.iter().map(|&key| (key, key * 10)).collect()
    }

    fn keys_of(map: &PersistentRankedMap<i32, i32>) -> Vec<i32> {
        map.keys().copied().collect()
    }

    #[rstest]
    fn test_new_is_empty() {
        let map: PersistentRankedMap<i32, i32> = PersistentRankedMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.first(), None);
        assert_eq!(map.last(), None);
        assert!(map.validate().is_ok());
    }

    #[rstest]
    fn test_set_then_get() {
        let map = from_keys(&[3, 1, 2]);
        assert_eq!(map.get(&2), Some(&20));
        assert_eq!(map.get(&4), None);
        assert!(map.contains_key(&1));
        assert!(map.validate().is_ok());
    }

    #[rstest]
    fn test_set_existing_key_replaces_value_only() {
        let map = from_keys(&[1, 2, 3]);
        let updated = map.set(2, 99);
        assert_eq!(updated.len(), 3);
        assert_eq!(updated.get(&2), Some(&99));
        assert_eq!(map.get(&2), Some(&20));
        assert_eq!(updated.get(&1), map.get(&1));
    }

    #[rstest]
    fn test_clear_absent_key_returns_same_tree() {
        let map = from_keys(&[1, 2, 3]);
        assert!(map.clear(&7).ptr_eq(&map));
    }

    #[rstest]
    fn test_clear_twice_matches_clear_once() {
        let map = from_keys(&[1, 2, 3, 4]);
        let once = map.clear(&3);
        assert_eq!(once.clear(&3), once);
        assert_eq!(keys_of(&once), vec![1, 2, 4]);
        assert_eq!(keys_of(&map), vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn test_clear_range_half_open() {
        let map = from_keys(&[10, 20, 30, 40]);
        let cleared = map.clear_range(Position::Key(&20), Position::Key(&40));
        assert_eq!(keys_of(&cleared), vec![10, 40]);
        assert!(cleared.validate().is_ok());
    }

    #[rstest]
    #[case(Position::BeforeStart, Position::AfterEnd, vec![])]
    #[case(Position::BeforeStart, Position::Key(&25), vec![30, 40])]
    #[case(Position::Key(&25), Position::AfterEnd, vec![10, 20])]
    #[case(Position::Key(&15), Position::Key(&16), vec![10, 20, 30, 40])]
    fn test_clear_range_with_sentinels(
        #[case] start: Position<&i32>,
        #[case] end: Position<&i32>,
        #[case] expected: Vec<i32>,
    ) {
        let map = from_keys(&[10, 20, 30, 40]);
        let cleared = map.clear_range(start, end);
        assert_eq!(keys_of(&cleared), expected);
        assert!(cleared.validate().is_ok());
    }

    #[rstest]
    #[case(Position::AfterEnd, Position::AfterEnd)]
    #[case(Position::BeforeStart, Position::BeforeStart)]
    #[case(Position::Key(&40), Position::Key(&10))]
    fn test_clear_range_empty_or_inverted_is_noop(#[case] start: Position<&i32>, #[case] end: Position<&i32>) {
        let map = from_keys(&[10, 20, 30, 40]);
        assert!(map.clear_range(start, end).ptr_eq(&map));
    }

    #[rstest]
    fn test_try_operations_reject_sentinels() {
        let map = from_keys(&[1]);
        let expected = RankedMapError::InvalidKey { sentinel: "after end" };
        assert_eq!(map.try_get(Position::AfterEnd), Err(expected.clone()));
        assert_eq!(map.try_set(Position::AfterEnd, 5).err(), Some(expected.clone()));
        assert_eq!(map.try_clear(Position::AfterEnd).err(), Some(expected));
        assert_eq!(map.try_get(Position::Key(&1)), Ok(Some(&10)));
        assert_eq!(map.try_set(Position::Key(2), 20).map(|map| map.len()), Ok(2));
        assert_eq!(map.try_clear(Position::Key(&1)).map(|map| map.len()), Ok(0));
    }

    #[rstest]
    #[case(Position::Key(&4), false, 1, Position::Key(&5))]
    #[case(Position::Key(&4), false, 2, Position::Key(&8))]
    #[case(Position::Key(&4), false, -10, Position::BeforeStart)]
    #[case(Position::Key(&5), false, 1, Position::Key(&5))]
    #[case(Position::Key(&5), true, 1, Position::Key(&8))]
    #[case(Position::Key(&8), true, 1, Position::AfterEnd)]
    #[case(Position::BeforeStart, false, 2, Position::Key(&2))]
    #[case(Position::AfterEnd, true, -5, Position::Key(&1))]
    #[case(Position::AfterEnd, true, -6, Position::BeforeStart)]
    fn test_get_key(
        #[case] position: Position<&i32>,
        #[case] inclusive: bool,
        #[case] offset: isize,
        #[case] expected: Position<&i32>,
    ) {
        let map = from_keys(&[1, 2, 3, 5, 8]);
        assert_eq!(map.get_key(position, inclusive, offset), expected);
    }

    #[rstest]
    fn test_get_key_on_empty_map() {
        let map = from_keys(&[]);
        assert_eq!(map.get_key(Position::BeforeStart, false, 1), Position::AfterEnd);
        assert_eq!(map.get_key(Position::AfterEnd, false, -1), Position::BeforeStart);
    }

    #[rstest]
    fn test_rank_helpers() {
        let map = from_keys(&[1, 2, 3, 5, 8]);
        assert_eq!(map.rank_of(&5), 3);
        assert_eq!(map.rank_of(&4), 3);
        assert_eq!(map.rank_of(&0), 0);
        assert_eq!(map.get_index(4), Some((&8, &80)));
        assert_eq!(map.first(), Some((&1, &10)));
        assert_eq!(map.last(), Some((&8, &80)));
    }

    #[rstest]
    fn test_entries_both_directions() {
        let map = PersistentRankedMap::new().set(5, "e").set(1, "a").set(3, "c");
        let forward: Vec<_> = map.entries(false).collect();
        assert_eq!(forward, vec![(&1, &"a"), (&3, &"c"), (&5, &"e")]);
        let backward: Vec<_> = map.entries(true).collect();
        assert_eq!(backward, vec![(&5, &"e"), (&3, &"c"), (&1, &"a")]);
    }

    #[rstest]
    fn test_forward_and_backward_iter() {
        let map = from_keys(&[1, 2, 3, 5, 8]);
        let forward: Vec<i32> = map.forward_iter(Position::Key(&4), false, 1).map(|(key, _)| *key).collect();
        assert_eq!(forward, vec![5, 8]);
        let backward: Vec<i32> = map.backward_iter(Position::Key(&4), false, 1).map(|(key, _)| *key).collect();
        assert_eq!(backward, vec![5, 3, 2, 1]);
    }

    #[rstest]
    #[case(Boundary::key(&2), Boundary::key(&5), RangeOptions::default(), vec![2, 3])]
    #[case(Boundary::key(&2), Boundary::key(&5).inclusive(true), RangeOptions::default(), vec![2, 3, 5])]
    #[case(Boundary::before_start(), Boundary::after_end(), RangeOptions { limit: Some(2), reverse: false }, vec![1, 2])]
    #[case(Boundary::before_start(), Boundary::after_end(), RangeOptions { limit: Some(2), reverse: true }, vec![8, 5])]
    #[case(Boundary::key(&2).offset(0), Boundary::key(&5).offset(3), RangeOptions { limit: None, reverse: true }, vec![8, 5, 3, 2, 1])]
    #[case(Boundary::key(&5), Boundary::key(&2), RangeOptions::default(), vec![])]
    #[case(Boundary::after_end(), Boundary::after_end().offset(5), RangeOptions::default(), vec![])]
    fn test_get_range(
        #[case] start: Boundary<'static, i32>,
        #[case] end: Boundary<'static, i32>,
        #[case] options: RangeOptions,
        #[case] expected: Vec<i32>,
    ) {
        let map = from_keys(&[1, 2, 3, 5, 8]);
        let keys: Vec<i32> = map.get_range(start, end, options).map(|(key, _)| *key).collect();
        assert_eq!(keys, expected);
    }

    #[rstest]
    fn test_reverse_comparator_orders_descending() {
        let map = PersistentRankedMap::with_comparator(Reverse(NaturalOrder))
            .set(1, ())
            .set(3, ())
            .set(2, ());
        let keys: Vec<&i32> = map.keys().collect();
        assert_eq!(keys, vec![&3, &2, &1]);
        assert_eq!(map.get_key(Position::Key(&3), false, 2), Position::Key(&2));
        assert!(map.validate().is_ok());
    }

    #[rstest]
    fn test_display_and_debug() {
        let map = from_keys(&[2, 1]);
        assert_eq!(map.to_string(), "{1: 10, 2: 20}");
        assert_eq!(format!("{map:?}"), "{1: 10, 2: 20}");
    }

    #[rstest]
    fn test_equality_is_entry_wise() {
        let left = from_keys(&[1, 2, 3]);
        let right = from_keys(&[3, 2, 1]);
        assert_eq!(left, right);
        assert_ne!(left, right.set(2, 0));
    }
}

//! Key-or-boundary positions.
//!
//! Range and rank operations accept a [`Position`]: either a real key or one of
//! the two sentinels that sit strictly before the smallest key and strictly
//! after the largest one. Sentinels are never keys; passing one to a
//! `try_get`/`try_set`/`try_clear` call is rejected with
//! [`RankedMapError::InvalidKey`].

use std::fmt;

use crate::error::RankedMapError;

/// A key, or one of the two virtual positions outside the key range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position<K> {
    /// The virtual slot before the minimum key.
    BeforeStart,
    /// A real key.
    Key(K),
    /// The virtual slot after the maximum key.
    AfterEnd,
}

impl<K> Position<K> {
    /// Returns `true` for [`Position::BeforeStart`] and [`Position::AfterEnd`].
    #[inline]
    pub const fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Key(_))
    }

    /// Converts from `&Position<K>` to `Position<&K>`.
    #[inline]
    pub const fn as_ref(&self) -> Position<&K> {
        match self {
            Self::BeforeStart => Position::BeforeStart,
            Self::Key(key) => Position::Key(key),
            Self::AfterEnd => Position::AfterEnd,
        }
    }

    /// Maps the key with `function`, keeping sentinels as they are.
    pub fn map<L, F: FnOnce(K) -> L>(self, function: F) -> Position<L> {
        match self {
            Self::BeforeStart => Position::BeforeStart,
            Self::Key(key) => Position::Key(function(key)),
            Self::AfterEnd => Position::AfterEnd,
        }
    }

    /// Returns the key, or `None` for a sentinel.
    #[inline]
    pub fn key(self) -> Option<K> {
        match self {
            Self::Key(key) => Some(key),
            Self::BeforeStart | Self::AfterEnd => None,
        }
    }

    /// Returns the key, or [`RankedMapError::InvalidKey`] for a sentinel.
    ///
    /// # Errors
    ///
    /// Fails when `self` is [`Position::BeforeStart`] or [`Position::AfterEnd`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rankmap::{Position, RankedMapError};
    ///
    /// assert_eq!(Position::Key(7).into_key(), Ok(7));
    /// assert_eq!(
    ///     Position::<i32>::AfterEnd.into_key(),
    ///     Err(RankedMapError::InvalidKey { sentinel: "after end" })
    /// );
    /// ```
    pub fn into_key(self) -> Result<K, RankedMapError> {
        match self {
            Self::Key(key) => Ok(key),
            Self::BeforeStart => Err(RankedMapError::InvalidKey {
                sentinel: BEFORE_START,
            }),
            Self::AfterEnd => Err(RankedMapError::InvalidKey {
                sentinel: AFTER_END,
            }),
        }
    }
}

impl<K: Clone> Position<&K> {
    /// Maps a `Position<&K>` to a `Position<K>` by cloning the key.
    pub fn cloned(self) -> Position<K> {
        self.map(Clone::clone)
    }
}

impl<K> From<K> for Position<K> {
    #[inline]
    fn from(key: K) -> Self {
        Self::Key(key)
    }
}

const BEFORE_START: &str = "before start";
const AFTER_END: &str = "after end";

impl<K: fmt::Display> fmt::Display for Position<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeStart => formatter.write_str(BEFORE_START),
            Self::Key(key) => write!(formatter, "{key}"),
            Self::AfterEnd => formatter.write_str(AFTER_END),
        }
    }
}

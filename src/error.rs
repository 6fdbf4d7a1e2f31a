//! Error types for the seqcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Expected, caller-facing failures: reading past the end
//!   of the sequence, or a replayed change batch that does not match the
//!   source.
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero capacity).
//! - [`InvariantError`]: Returned by `check_invariants` walks when the
//!   index/recency cross-links are corrupt.
//!
//! Corruption detected on the hot path is not an error value: the cache
//! panics instead of serving a value it can no longer vouch for.
//!
//! ## Example Usage
//!
//! ```
//! use seqcache::error::{CacheError, ConfigError};
//! use seqcache::policy::bounded::BoundedCache;
//! use seqcache::source::ListSource;
//!
//! let bad: Result<BoundedCache<ListSource<u8>>, ConfigError> =
//!     BoundedCache::try_new(ListSource::new(), 0);
//! assert!(bad.is_err());
//!
//! let mut cache = BoundedCache::new(ListSource::from(vec![1u8, 2]), 4);
//! assert_eq!(
//!     cache.get(5).unwrap_err(),
//!     CacheError::OutOfRange { position: 5, len: 2 }
//! );
//! ```

use thiserror::Error;

use crate::source::Change;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failures a caller is expected to handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// `get` (or another positional call) past the end of the sequence.
    #[error("position {position} out of range for sequence of length {len}")]
    OutOfRange { position: usize, len: usize },

    /// A replayed change names a position the index cannot hold at that
    /// point of the batch. The cache has been resynchronized.
    #[error("{change} is inconsistent with indexed length {len}")]
    InvalidChange { change: Change, len: usize },

    /// The batch replayed cleanly but its net effect disagrees with the
    /// source. The cache has been resynchronized.
    #[error("replayed batch leaves {indexed} slots but the source holds {expected}")]
    LengthMismatch { indexed: usize, expected: usize },
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on
/// [`SparseIndex`](crate::ds::SparseIndex),
/// [`RecencyOrder`](crate::ds::RecencyOrder) and
/// [`BoundedCache`](crate::policy::bounded::BoundedCache).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// # Example
///
/// ```
/// use seqcache::builder::BoundedCacheBuilder;
/// use seqcache::source::ListSource;
///
/// let err = BoundedCacheBuilder::new(0)
///     .try_build(ListSource::<u32>::new())
///     .unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn out_of_range_display_names_position_and_len() {
        let err = CacheError::OutOfRange { position: 9, len: 3 };
        assert_eq!(
            err.to_string(),
            "position 9 out of range for sequence of length 3"
        );
    }

    #[test]
    fn invalid_change_display_includes_change() {
        let err = CacheError::InvalidChange {
            change: Change::delete(4),
            len: 4,
        };
        assert_eq!(err.to_string(), "delete at 4 is inconsistent with indexed length 4");
    }

    #[test]
    fn length_mismatch_display() {
        let err = CacheError::LengthMismatch {
            indexed: 2,
            expected: 5,
        };
        assert!(err.to_string().contains("leaves 2 slots"));
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("entry count mismatch");
        assert_eq!(err.to_string(), "entry count mismatch");
        assert_eq!(err.message(), "entry count mismatch");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
        assert_eq!(err.message(), "capacity must be > 0");
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CacheError>();
        assert_error::<ConfigError>();
        assert_error::<InvariantError>();
    }
}

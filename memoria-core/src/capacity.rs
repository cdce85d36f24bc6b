use std::fmt;
use std::num::NonZeroUsize;

use crate::error::ConfigurationError;

/// Size limit of a memoization cache.
///
/// # Variants
///
/// * `Unbounded` - no limit; nothing is ever evicted and hits do no recency
///   bookkeeping.
/// * `Bounded(n)` - at most `n` entries; inserting a new key into a full cache
///   evicts the least recently used entry first.
///
/// # Examples
///
/// ```
/// use memoria_core::Capacity;
///
/// assert_eq!(Capacity::new(None), Ok(Capacity::Unbounded));
/// assert!(Capacity::new(Some(3)).unwrap().is_bounded());
/// assert!(Capacity::new(Some(0)).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Capacity {
    #[default]
    Unbounded,
    Bounded(NonZeroUsize),
}

impl Capacity {
    /// Validates an optional `max_size`. `None` means unbounded, zero is rejected.
    pub fn new(max_size: Option<usize>) -> Result<Self, ConfigurationError> {
        match max_size {
            None => Ok(Capacity::Unbounded),
            Some(n) => NonZeroUsize::new(n)
                .map(Capacity::Bounded)
                .ok_or(ConfigurationError::ZeroCapacity),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Capacity::Unbounded => None,
            Capacity::Bounded(n) => Some(n.get()),
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Capacity::Bounded(_))
    }
}

/// `None` maps to `Unbounded`. Used by the `#[memoize]` attribute, which
/// rejects `max_size = 0` at compile time.
impl From<Option<NonZeroUsize>> for Capacity {
    fn from(limit: Option<NonZeroUsize>) -> Self {
        limit.map_or(Capacity::Unbounded, Capacity::Bounded)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Unbounded => f.write_str("unbounded"),
            Capacity::Bounded(n) => write!(f, "{}", n),
        }
    }
}

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Rejected wrapper configuration.
///
/// Returned by [`wrap_with`](crate::wrap_with) and [`Capacity::new`](crate::Capacity::new)
/// before any call is made, so a misconfigured wrapper never exists.
///
/// # Examples
///
/// ```
/// use memoria_core::{Capacity, ConfigurationError};
///
/// assert_eq!(Capacity::new(Some(0)), Err(ConfigurationError::ZeroCapacity));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("max_size must be greater than zero (use None for an unbounded cache)")]
    ZeroCapacity,
}

/// Which part of the argument list a key strategy failed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgPosition {
    /// The positional arguments, converted as one group.
    Positional,
    /// The name of a named argument.
    Name(String),
    /// The value bound to a named argument.
    Named(String),
}

impl fmt::Display for ArgPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgPosition::Positional => f.write_str("positional arguments"),
            ArgPosition::Name(name) => write!(f, "name of argument `{}`", name),
            ArgPosition::Named(name) => write!(f, "value of argument `{}`", name),
        }
    }
}

/// The configured key strategy could not turn an argument into a key part.
///
/// Conversion functions return this with only a reason; the key deriver
/// fills in the position of the argument that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot derive cache key from {position}: {reason}")]
pub struct KeyDerivationError {
    pub position: ArgPosition,
    pub reason: String,
}

impl KeyDerivationError {
    /// Creates an error for a conversion function to return.
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            position: ArgPosition::Positional,
            reason: reason.into(),
        }
    }

    pub(crate) fn at(mut self, position: ArgPosition) -> Self {
        self.position = position;
        self
    }
}

/// Error returned by [`Memoized::invoke`](crate::Memoized::invoke).
///
/// `Failed` carries the failure raised by the wrapped callable. When failure
/// caching is enabled, every replay of a cached failure hands out the same
/// `Arc`, so callers can tell a replay from a fresh failure with [`Arc::ptr_eq`].
#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error(transparent)]
    KeyDerivation(#[from] KeyDerivationError),

    #[error("{0}")]
    Failed(Arc<E>),
}

impl<E> CallError<E> {
    /// Returns the underlying failure, if this error came from the wrapped callable.
    pub fn failure(&self) -> Option<&Arc<E>> {
        match self {
            CallError::Failed(failure) => Some(failure),
            CallError::KeyDerivation(_) => None,
        }
    }

    /// Consumes the error and returns the underlying failure.
    pub fn into_failure(self) -> Option<Arc<E>> {
        match self {
            CallError::Failed(failure) => Some(failure),
            CallError::KeyDerivation(_) => None,
        }
    }

    /// Returns `true` if the key could not be derived and nothing was invoked.
    pub fn is_key_derivation(&self) -> bool {
        matches!(self, CallError::KeyDerivation(_))
    }
}

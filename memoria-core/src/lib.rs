//! # Memoria Core
//!
//! Core building blocks of the memoria memoization library.
//!
//! ## Features
//!
//! - **Memoized callables**: wrap a function, method or constructor with [`wrap`] / [`wrap_with`]
//! - **Key strategies**: identity keys (default) or value conversion, see [`KeyStrategy`]
//! - **LRU eviction**: optional size limit with least-recently-used eviction
//! - **Failure caching**: optionally replay the exact failure of an earlier call
//! - **Statistics**: hit/miss/eviction counters and a named registry
//!
//! ## Module Organization
//!
//! - [`args`] - argument lists passed to memoized callables
//! - [`keys`] - key derivation strategies and the `CacheableKey` trait
//! - [`lru_store`] - the bounded/unbounded outcome store
//! - [`memoizer`] - the hit/miss/store state machine
//! - [`memoized`] - the `Memoized` wrapper and its options
//! - [`shared`] - a mutex-guarded wrapper for concurrent callers
//! - [`stats_registry`] - named statistics of macro-generated global caches
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use memoria_core::{wrap_with, CallArgs, MemoizeOptions};
//!
//! let mut parse = wrap_with(
//!     |args: &CallArgs| -> Result<u16, String> {
//!         let text = args.get::<&str>(0).ok_or("expected text")?;
//!         text.parse::<u16>().map_err(|e| e.to_string())
//!     },
//!     MemoizeOptions::new().max_size(2).cache_failures(true),
//! )
//! .unwrap();
//!
//! let bad = CallArgs::new().arg("port?");
//! let first = parse.invoke(&bad).unwrap_err();
//! let second = parse.invoke(&bad).unwrap_err();
//! // the cached failure is replayed, not recomputed
//! assert!(Arc::ptr_eq(first.failure().unwrap(), second.failure().unwrap()));
//! ```
pub mod args;
mod cache_entry;
mod capacity;
mod error;
pub mod keys;
pub mod lru_store;
pub mod memoized;
pub mod memoizer;
pub mod shared;
mod stats;
pub mod stats_registry;

pub use args::{Arg, Argument, CallArgs};
pub use cache_entry::CacheEntry;
pub use capacity::Capacity;
pub use error::{ArgPosition, CallError, ConfigurationError, KeyDerivationError};
pub use keys::{CacheKey, CacheableKey, ConvertFn, KeyStrategy};
pub use lru_store::LruStore;
pub use memoized::{wrap, wrap_with, BoundMethod, MemoizeOptions, Memoized};
pub use memoizer::{Memoizer, PendingCall};
pub use shared::SharedMemoized;
pub use stats::CacheStats;

/// Re-exports used by code generated by `#[memoize]`.
#[doc(hidden)]
pub mod __private {
    pub use once_cell;
    pub use parking_lot;
}

//! # Memoria
//!
//! Memoization for functions, methods and constructors, with an optional
//! least-recently-used size limit and optional caching of failures.
//!
//! ## Features
//!
//! - **Two front ends**: the `#[memoize]` attribute for ordinary Rust functions,
//!   and [`wrap`] / [`wrap_with`] for callables taking dynamic [`CallArgs`]
//! - **LRU eviction**: set a maximum size and the least recently used outcome goes first
//! - **Failure caching**: optionally remember a failed call and hand back the very
//!   same failure on the next call with the same arguments
//! - **Key strategies**: identity keys (argument objects are compared by address)
//!   or keys converted from argument values
//! - **Statistics**: hit, miss and eviction counters, with a named registry for
//!   global caches
//!
//! ## Quick Start
//!
//! ```rust
//! use memoria::memoize;
//!
//! #[memoize(max_size = 64)]
//! fn fibonacci(n: u64) -> u64 {
//!     if n < 2 {
//!         return n;
//!     }
//!     fibonacci(n - 1) + fibonacci(n - 2)
//! }
//!
//! assert_eq!(fibonacci(40), 102_334_155);
//! ```
//!
//! ## Failure Caching
//!
//! By default only `Ok` values are cached. With `cache_failures = true` an `Err`
//! is cached too, and the body does not run again for the same arguments:
//!
//! ```rust
//! use std::cell::Cell;
//! use memoria::memoize;
//!
//! thread_local!(static ATTEMPTS: Cell<u32> = Cell::new(0));
//!
//! #[memoize(cache_failures = true)]
//! fn connect(host: String) -> Result<u16, String> {
//!     ATTEMPTS.with(|a| a.set(a.get() + 1));
//!     Err(format!("{} unreachable", host))
//! }
//!
//! assert!(connect("db".to_string()).is_err());
//! assert!(connect("db".to_string()).is_err());
//! assert_eq!(ATTEMPTS.with(|a| a.get()), 1);
//! ```
//!
//! ## Wrapping Callables
//!
//! [`wrap_with`] memoizes a callable over dynamic arguments. Outcomes come back
//! behind an `Arc`, so a hit hands out the very object the first call produced:
//!
//! ```rust
//! use std::sync::Arc;
//! use memoria::{wrap_with, CallArgs, KeyStrategy, MemoizeOptions};
//!
//! #[derive(Debug)]
//! struct Connection {
//!     host: String,
//! }
//!
//! let mut open = wrap_with(
//!     |args: &CallArgs| -> Result<Connection, String> {
//!         let host = args.named_value::<String>("host").ok_or("missing host")?;
//!         Ok(Connection { host: host.clone() })
//!     },
//!     MemoizeOptions::new()
//!         .max_size(8)
//!         .key_strategy(KeyStrategy::debug()),
//! )
//! .unwrap();
//!
//! let first = open.invoke(&CallArgs::new().named("host", "db".to_string())).unwrap();
//! let again = open.invoke(&CallArgs::new().named("host", "db".to_string())).unwrap();
//! assert_eq!(first.host, "db");
//! assert!(Arc::ptr_eq(&first, &again));
//! ```

pub use memoria_core::*;
pub use memoria_macros::memoize;

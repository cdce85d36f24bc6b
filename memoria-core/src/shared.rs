use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Arg, CallArgs, CallError, Memoized};

/// A [`Memoized`] that can be called from several threads.
///
/// The whole call (key derivation, lookup, the wrapped callable and the store
/// update) runs under one `parking_lot::Mutex`, so the eviction decision taken
/// before the callable runs is never interleaved with another call.
/// Concurrent callers of the same wrapper are therefore serialized, and a
/// callable that calls back into its own `SharedMemoized` deadlocks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use memoria_core::{wrap_with, CallArgs, KeyStrategy, MemoizeOptions, SharedMemoized};
///
/// let square = wrap_with(
///     |args: &CallArgs| Ok::<_, String>(args.get::<u64>(0).map_or(0, |n| n * n)),
///     MemoizeOptions::new().max_size(16).key_strategy(KeyStrategy::debug()),
/// )
/// .unwrap();
/// let square = Arc::new(SharedMemoized::new(square));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let square = Arc::clone(&square);
///         thread::spawn(move || *square.invoke(&CallArgs::new().arg(9_u64)).unwrap())
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), 81);
/// }
/// assert_eq!(square.stats_snapshot().misses(), 1);
/// ```
pub struct SharedMemoized<F, R, E> {
    inner: Mutex<Memoized<F, R, E>>,
}

impl<F, R, E> SharedMemoized<F, R, E>
where
    F: FnMut(&CallArgs) -> Result<R, E>,
{
    pub fn new(memoized: Memoized<F, R, E>) -> Self {
        Self {
            inner: Mutex::new(memoized),
        }
    }

    pub fn invoke(&self, args: &CallArgs) -> Result<Arc<R>, CallError<E>> {
        self.inner.lock().invoke(args)
    }

    /// Calls the wrapper as a method of `receiver`, see [`Memoized::bind`].
    pub fn invoke_bound(&self, receiver: Arg, args: &CallArgs) -> Result<Arc<R>, CallError<E>> {
        self.inner.lock().bind(receiver).invoke(args)
    }
}

impl<F, R, E> SharedMemoized<F, R, E> {
    /// Runs `f` with exclusive access to the wrapped [`Memoized`].
    pub fn with<T>(&self, f: impl FnOnce(&mut Memoized<F, R, E>) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Copy of the current statistics.
    pub fn stats_snapshot(&self) -> crate::CacheStats {
        self.inner.lock().stats().clone()
    }

    pub fn into_inner(self) -> Memoized<F, R, E> {
        self.inner.into_inner()
    }
}

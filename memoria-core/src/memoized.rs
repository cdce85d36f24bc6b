use std::fmt;
use std::sync::Arc;

use crate::{
    Arg, CallArgs, CallError, CacheKey, CacheStats, Capacity, ConfigurationError,
    KeyDerivationError, KeyStrategy, Memoizer,
};

/// Configuration of a memoized callable.
///
/// # Examples
///
/// ```
/// use memoria_core::{KeyStrategy, MemoizeOptions};
///
/// let options = MemoizeOptions::new()
///     .max_size(128)
///     .cache_failures(true)
///     .key_strategy(KeyStrategy::debug())
///     .name("load_profile");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoizeOptions {
    max_size: Option<usize>,
    cache_failures: bool,
    key_strategy: KeyStrategy,
    name: Option<String>,
}

impl MemoizeOptions {
    /// Unbounded cache, failures not cached, identity keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of cached outcomes. Zero is rejected by [`wrap_with`].
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Removes the size limit.
    pub fn unbounded(mut self) -> Self {
        self.max_size = None;
        self
    }

    /// Also cache failures and replay them on later calls with the same key.
    pub fn cache_failures(mut self, cache_failures: bool) -> Self {
        self.cache_failures = cache_failures;
        self
    }

    pub fn key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    /// Name reported by [`Memoized::name`] and used in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Wraps `func` with the default configuration: unbounded, failures not
/// cached, identity keys.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use memoria_core::{wrap, CallArgs};
///
/// let mut double = wrap(|args: &CallArgs| -> Result<i64, String> {
///     let n = args.get::<i64>(0).ok_or("expected an i64")?;
///     Ok(n * 2)
/// });
///
/// let args = CallArgs::new().arg(21_i64);
/// let first = double.invoke(&args).unwrap();
/// let second = double.invoke(&args).unwrap();
/// assert_eq!(*first, 42);
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub fn wrap<F, R, E>(func: F) -> Memoized<F, R, E>
where
    F: FnMut(&CallArgs) -> Result<R, E>,
{
    Memoized::build(func, Capacity::Unbounded, false, KeyStrategy::Identity, None)
}

/// Wraps `func` with explicit options.
///
/// # Errors
///
/// [`ConfigurationError::ZeroCapacity`] when `max_size` is zero.
pub fn wrap_with<F, R, E>(
    func: F,
    options: MemoizeOptions,
) -> Result<Memoized<F, R, E>, ConfigurationError>
where
    F: FnMut(&CallArgs) -> Result<R, E>,
{
    let capacity = Capacity::new(options.max_size)?;
    Ok(Memoized::build(
        func,
        capacity,
        options.cache_failures,
        options.key_strategy,
        options.name,
    ))
}

/// A callable wrapped with a memoization cache.
///
/// Each call derives a [`CacheKey`] from its arguments. A cached outcome is
/// handed back as is: the same `Arc<R>` for a success, the same `Arc<E>` for a
/// cached failure. Otherwise the wrapped callable runs and its outcome is
/// stored following [`Memoizer`]'s rules.
///
/// The wrapper owns its cache; no two wrappers share entries. `invoke` takes
/// `&mut self`, so concurrent use needs [`SharedMemoized`](crate::SharedMemoized)
/// or another lock around the whole call.
///
/// Constructors memoize like any other callable and return the constructed
/// type behind an `Arc`, so the value keeps its type.
pub struct Memoized<F, R, E> {
    func: F,
    keys: KeyStrategy,
    memo: Memoizer<CacheKey, Arc<R>, Arc<E>>,
}

impl<F, R, E> Memoized<F, R, E>
where
    F: FnMut(&CallArgs) -> Result<R, E>,
{
    fn build(
        func: F,
        capacity: Capacity,
        cache_failures: bool,
        keys: KeyStrategy,
        name: Option<String>,
    ) -> Self {
        let name = name.unwrap_or_else(|| std::any::type_name::<F>().to_string());
        tracing::debug!(
            cache = %name,
            %capacity,
            cache_failures,
            identity_keys = keys.is_identity(),
            "memoizing callable"
        );
        Self {
            func,
            keys,
            memo: Memoizer::new(name, capacity, cache_failures),
        }
    }

    /// Calls the wrapped callable through the cache.
    ///
    /// # Errors
    ///
    /// * [`CallError::KeyDerivation`] - the key strategy rejected an argument;
    ///   nothing was looked up, invoked or stored.
    /// * [`CallError::Failed`] - the callable failed on this call, or a cached
    ///   failure was replayed.
    pub fn invoke(&mut self, args: &CallArgs) -> Result<Arc<R>, CallError<E>> {
        let key = self.keys.derive(args)?;
        let func = &mut self.func;
        self.memo
            .call(key, || func(args).map(Arc::new).map_err(Arc::new))
            .map_err(CallError::Failed)
    }

    /// Binds a receiver so the wrapper can be called as a method of it.
    ///
    /// The receiver becomes the first positional argument, so it takes part in
    /// the key like any other argument.
    pub fn bind(&mut self, receiver: Arg) -> BoundMethod<'_, F, R, E> {
        BoundMethod {
            memoized: self,
            receiver,
        }
    }

    /// `true` if a call with `args` would be answered from the cache.
    pub fn is_cached(&self, args: &CallArgs) -> Result<bool, KeyDerivationError> {
        let key = self.keys.derive(args)?;
        Ok(self.memo.contains(&key))
    }
}

impl<F, R, E> Memoized<F, R, E> {
    /// Name of the wrapped entity, the callable's type name unless overridden.
    pub fn name(&self) -> &str {
        self.memo.name()
    }

    /// The wrapped entity itself.
    pub fn get_ref(&self) -> &F {
        &self.func
    }

    pub fn key_strategy(&self) -> &KeyStrategy {
        &self.keys
    }

    pub fn capacity(&self) -> Capacity {
        self.memo.capacity()
    }

    pub fn cache_failures(&self) -> bool {
        self.memo.cache_failures()
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        self.memo.stats()
    }
}

impl<F, R, E> fmt::Debug for Memoized<F, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .field("cache_failures", &self.cache_failures())
            .field("key_strategy", &self.keys)
            .field("len", &self.len())
            .finish()
    }
}

/// A [`Memoized`] bound to a receiver, see [`Memoized::bind`].
pub struct BoundMethod<'a, F, R, E> {
    memoized: &'a mut Memoized<F, R, E>,
    receiver: Arg,
}

impl<'a, F, R, E> BoundMethod<'a, F, R, E>
where
    F: FnMut(&CallArgs) -> Result<R, E>,
{
    pub fn invoke(&mut self, args: &CallArgs) -> Result<Arc<R>, CallError<E>> {
        let args = args.with_receiver(Arc::clone(&self.receiver));
        self.memoized.invoke(&args)
    }

    pub fn receiver(&self) -> &Arg {
        &self.receiver
    }
}

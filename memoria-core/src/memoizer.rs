use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::{CacheEntry, CacheStats, Capacity, LruStore};

/// Eviction decision taken before the wrapped callable runs.
///
/// Returned by [`Memoizer::begin_miss`] and handed back to
/// [`Memoizer::complete`] once the call has produced its outcome.
#[must_use = "pass the pending call to Memoizer::complete"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingCall {
    should_evict: bool,
}

impl PendingCall {
    pub fn should_evict(&self) -> bool {
        self.should_evict
    }
}

/// The memoization state machine, independent of how keys are derived.
///
/// A call goes through three steps:
///
/// 1. [`lookup`](Self::lookup) - a hit replays the stored outcome (a stored
///    failure comes back as `Err`).
/// 2. [`begin_miss`](Self::begin_miss) - on a miss, record whether the store is
///    already full, *before* the callable runs.
/// 3. [`complete`](Self::complete) - store the outcome. Successes are always
///    stored; failures only when failure caching is on. If step 2 saw a full
///    store, the least recently used entry is evicted first.
///
/// No borrow is held while the callable runs, so a memoized function may call
/// itself. If such reentrant calls fill the store in the meantime, `put`
/// still evicts before inserting and the capacity is never exceeded.
///
/// [`call`](Self::call) runs the three steps around a closure when reentrancy
/// is not a concern.
///
/// # Examples
///
/// ```
/// use memoria_core::{Capacity, Memoizer};
///
/// let mut memo: Memoizer<u32, u64, String> = Memoizer::new("square", Capacity::Unbounded, false);
///
/// assert_eq!(memo.call(4, || Ok(16)), Ok(16));
/// // second call is answered from the cache
/// assert_eq!(memo.call(4, || Err("not called".to_string())), Ok(16));
/// assert_eq!(memo.stats().hits(), 1);
/// ```
pub struct Memoizer<K: Hash + Eq, T, E> {
    name: String,
    store: LruStore<K, CacheEntry<T, E>>,
    cache_failures: bool,
    stats: Arc<CacheStats>,
}

impl<K, T, E> Memoizer<K, T, E>
where
    K: Hash + Eq + Debug,
    T: Clone,
    E: Clone,
{
    pub fn new(name: impl Into<String>, capacity: Capacity, cache_failures: bool) -> Self {
        Self {
            name: name.into(),
            store: LruStore::new(capacity),
            cache_failures,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Replays the stored outcome for `key`, if any.
    pub fn lookup(&mut self, key: &K) -> Option<Result<T, E>> {
        match self.store.get(key) {
            Some(entry) => {
                let outcome = entry.to_result();
                if outcome.is_err() {
                    self.stats.record_failure_hit();
                    tracing::trace!(cache = %self.name, ?key, "cache hit, replaying failure");
                } else {
                    self.stats.record_hit();
                    tracing::trace!(cache = %self.name, ?key, "cache hit");
                }
                Some(outcome)
            }
            None => {
                self.stats.record_miss();
                tracing::trace!(cache = %self.name, ?key, "cache miss");
                None
            }
        }
    }

    /// Takes the eviction decision for a miss.
    pub fn begin_miss(&self) -> PendingCall {
        PendingCall {
            should_evict: self.store.is_full(),
        }
    }

    /// Stores the outcome of a missed call according to the failure policy.
    pub fn complete(&mut self, key: K, pending: PendingCall, outcome: &Result<T, E>) {
        if outcome.is_err() && !self.cache_failures {
            return;
        }

        if pending.should_evict {
            if let Some((evicted, _)) = self.store.evict_oldest_if_full() {
                self.note_eviction(&evicted);
            }
        }

        if outcome.is_err() {
            tracing::debug!(cache = %self.name, ?key, "caching failure");
        }
        if let Some((evicted, _)) = self.store.put(key, CacheEntry::from_result(outcome)) {
            self.note_eviction(&evicted);
        }
    }

    /// Answers `key` from the cache or runs `compute` and stores its outcome.
    pub fn call<F>(&mut self, key: K, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(outcome) = self.lookup(&key) {
            return outcome;
        }

        let pending = self.begin_miss();
        let outcome = compute();
        self.complete(key, pending, &outcome);
        outcome
    }

    fn note_eviction(&self, evicted: &K) {
        self.stats.record_eviction();
        tracing::debug!(cache = %self.name, key = ?evicted, "evicted least recently used entry");
    }
}

impl<K: Hash + Eq, T, E> Memoizer<K, T, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Capacity {
        self.store.capacity()
    }

    pub fn cache_failures(&self) -> bool {
        self.cache_failures
    }

    /// `true` if `key` is cached. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Cached keys from least to most recently used.
    pub fn keys(&self) -> Vec<&K> {
        self.store.keys()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drops every cached outcome. Statistics are kept.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Shared handle to the statistics, for the statistics registry.
    pub fn stats_handle(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn bounded(n: usize, cache_failures: bool) -> Memoizer<i32, i32, String> {
        Memoizer::new("test", Capacity::new(Some(n)).unwrap(), cache_failures)
    }

    #[test]
    fn test_success_cached_once() {
        let mut memo = bounded(3, false);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(10)
        };

        assert_eq!(memo.call(1, compute), Ok(10));
        assert_eq!(memo.call(1, compute), Ok(10));
        assert_eq!(calls.get(), 1);
        assert_eq!(memo.stats().hits(), 1);
        assert_eq!(memo.stats().misses(), 1);
    }

    #[test]
    fn test_failure_not_cached_by_default() {
        let mut memo = bounded(3, false);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        };

        assert_eq!(memo.call(1, compute), Err("failure 1".to_string()));
        assert_eq!(memo.call(1, compute), Err("failure 2".to_string()));
        assert!(memo.is_empty());
    }

    #[test]
    fn test_failure_cached_when_enabled() {
        let mut memo = bounded(3, true);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        };

        assert_eq!(memo.call(1, compute), Err("failure 1".to_string()));
        assert_eq!(memo.call(1, compute), Err("failure 1".to_string()));
        assert_eq!(calls.get(), 1);
        assert_eq!(memo.stats().failure_hits(), 1);
    }

    #[test]
    fn test_pending_call_snapshot_taken_before_compute() {
        let mut memo = bounded(2, false);
        memo.call(1, || Ok(1)).unwrap();
        assert!(!memo.begin_miss().should_evict());

        memo.call(2, || Ok(2)).unwrap();
        let pending = memo.begin_miss();
        assert!(pending.should_evict());

        memo.complete(3, pending, &Ok(3));
        assert_eq!(memo.keys(), vec![&2, &3]);
        assert_eq!(memo.stats().evictions(), 1);
    }

    #[test]
    fn test_uncached_failure_does_not_evict() {
        let mut memo = bounded(1, false);
        memo.call(1, || Ok(1)).unwrap();

        let pending = memo.begin_miss();
        assert!(pending.should_evict());
        memo.complete(2, pending, &Err("nope".to_string()));

        assert!(memo.contains(&1));
        assert_eq!(memo.stats().evictions(), 0);
    }

    #[test]
    fn test_reentrant_fill_still_respects_capacity() {
        let mut memo = bounded(2, false);

        // outer miss sees an empty store
        let outer = memo.begin_miss();
        assert!(!outer.should_evict());

        // nested calls fill the store while the outer body runs
        memo.call(10, || Ok(10)).unwrap();
        memo.call(20, || Ok(20)).unwrap();

        memo.complete(30, outer, &Ok(30));
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.keys(), vec![&20, &30]);
    }

    #[test]
    fn test_clear_keeps_stats() {
        let mut memo = bounded(2, false);
        memo.call(1, || Ok(1)).unwrap();
        memo.clear();
        assert!(memo.is_empty());
        assert_eq!(memo.stats().misses(), 1);
    }
}

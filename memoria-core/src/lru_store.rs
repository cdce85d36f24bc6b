use std::collections::HashMap;
use std::hash::Hash;

use lru::LruCache;

use crate::Capacity;

/// Key-to-entry store with optional least-recently-used eviction.
///
/// The store picks its representation from the [`Capacity`]:
///
/// | Mode      | Backing            | `get` hit            | Eviction                    |
/// |-----------|--------------------|----------------------|-----------------------------|
/// | Unbounded | `HashMap`          | O(1), no bookkeeping | never                       |
/// | Bounded   | `lru::LruCache`    | O(1), promotes key   | O(1), least recently used   |
///
/// In bounded mode every access is a distinct event, so recency order is total
/// and the entry untouched the longest is always the one evicted.
///
/// # Examples
///
/// ```
/// use memoria_core::{Capacity, LruStore};
///
/// let mut store = LruStore::new(Capacity::new(Some(2)).unwrap());
/// store.put("a", 1);
/// store.put("b", 2);
/// store.get(&"a"); // "b" is now the least recently used
///
/// let evicted = store.put("c", 3);
/// assert_eq!(evicted, Some(("b", 2)));
/// assert_eq!(store.keys(), vec![&"a", &"c"]);
/// ```
pub struct LruStore<K: Hash + Eq, V> {
    inner: Inner<K, V>,
}

enum Inner<K: Hash + Eq, V> {
    Unbounded(HashMap<K, V>),
    Bounded(LruCache<K, V>),
}

impl<K: Hash + Eq, V> LruStore<K, V> {
    pub fn new(capacity: Capacity) -> Self {
        let inner = match capacity {
            Capacity::Unbounded => Inner::Unbounded(HashMap::new()),
            Capacity::Bounded(limit) => Inner::Bounded(LruCache::new(limit)),
        };
        Self { inner }
    }

    pub fn capacity(&self) -> Capacity {
        match &self.inner {
            Inner::Unbounded(_) => Capacity::Unbounded,
            Inner::Bounded(cache) => Capacity::Bounded(cache.cap()),
        }
    }

    /// Looks up `key`, marking it most recently used in bounded mode.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match &mut self.inner {
            Inner::Unbounded(map) => map.get(key),
            Inner::Bounded(cache) => cache.get(key),
        }
    }

    /// Looks up `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        match &self.inner {
            Inner::Unbounded(map) => map.get(key),
            Inner::Bounded(cache) => cache.peek(key),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match &self.inner {
            Inner::Unbounded(map) => map.contains_key(key),
            Inner::Bounded(cache) => cache.contains(key),
        }
    }

    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// A new key inserted into a full store first evicts the least recently
    /// used entry, which is returned. Replacing the value of an existing key
    /// never evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        match &mut self.inner {
            Inner::Unbounded(map) => {
                map.insert(key, value);
                None
            }
            Inner::Bounded(cache) => {
                let evicted = if cache.contains(&key) {
                    None
                } else {
                    pop_if_full(cache)
                };
                cache.put(key, value);
                evicted
            }
        }
    }

    /// Evicts the least recently used entry when the store is at capacity.
    pub fn evict_oldest_if_full(&mut self) -> Option<(K, V)> {
        match &mut self.inner {
            Inner::Unbounded(_) => None,
            Inner::Bounded(cache) => pop_if_full(cache),
        }
    }

    /// `true` when inserting a new key would evict. Never true when unbounded.
    pub fn is_full(&self) -> bool {
        match &self.inner {
            Inner::Unbounded(_) => false,
            Inner::Bounded(cache) => cache.len() >= cache.cap().get(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Unbounded(map) => map.len(),
            Inner::Bounded(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            Inner::Unbounded(map) => map.clear(),
            Inner::Bounded(cache) => cache.clear(),
        }
    }

    /// Keys from least to most recently used. Unordered when unbounded.
    pub fn keys(&self) -> Vec<&K> {
        match &self.inner {
            Inner::Unbounded(map) => map.keys().collect(),
            Inner::Bounded(cache) => cache.iter().rev().map(|(key, _)| key).collect(),
        }
    }
}

fn pop_if_full<K: Hash + Eq, V>(cache: &mut LruCache<K, V>) -> Option<(K, V)> {
    if cache.len() >= cache.cap().get() {
        cache.pop_lru()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(n: usize) -> LruStore<i32, &'static str> {
        LruStore::new(Capacity::new(Some(n)).unwrap())
    }

    #[test]
    fn test_put_evicts_least_recently_inserted() {
        let mut store = bounded(3);
        assert_eq!(store.put(1, "one"), None);
        assert_eq!(store.put(2, "two"), None);
        assert_eq!(store.put(3, "three"), None);
        assert!(store.is_full());

        assert_eq!(store.put(4, "four"), Some((1, "one")));
        assert_eq!(store.keys(), vec![&2, &3, &4]);
    }

    #[test]
    fn test_get_promotes() {
        let mut store = bounded(3);
        store.put(1, "one");
        store.put(2, "two");
        store.put(3, "three");

        assert_eq!(store.get(&1), Some(&"one"));
        assert_eq!(store.put(4, "four"), Some((2, "two")));
        assert_eq!(store.keys(), vec![&3, &1, &4]);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut store = bounded(2);
        store.put(1, "one");
        store.put(2, "two");

        assert_eq!(store.peek(&1), Some(&"one"));
        assert_eq!(store.put(3, "three"), Some((1, "one")));
    }

    #[test]
    fn test_replace_existing_never_evicts() {
        let mut store = bounded(2);
        store.put(1, "one");
        store.put(2, "two");

        assert_eq!(store.put(1, "uno"), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.peek(&1), Some(&"uno"));
        // replacing refreshed key 1, so 2 goes next
        assert_eq!(store.put(3, "three"), Some((2, "two")));
    }

    #[test]
    fn test_evict_oldest_if_full() {
        let mut store = bounded(2);
        store.put(1, "one");
        assert_eq!(store.evict_oldest_if_full(), None);

        store.put(2, "two");
        assert_eq!(store.evict_oldest_if_full(), Some((1, "one")));
        assert_eq!(store.len(), 1);
        assert!(!store.is_full());
    }

    #[test]
    fn test_unbounded_never_evicts() {
        let mut store: LruStore<u32, u32> = LruStore::new(Capacity::Unbounded);
        for i in 0..10_000 {
            assert_eq!(store.put(i, i * 2), None);
        }
        assert!(!store.is_full());
        assert_eq!(store.evict_oldest_if_full(), None);
        assert_eq!(store.len(), 10_000);
        assert_eq!(store.get(&0), Some(&0));
        assert_eq!(store.get(&9_999), Some(&19_998));
    }

    #[test]
    fn test_capacity_and_clear() {
        let mut store = bounded(4);
        assert_eq!(store.capacity().limit(), Some(4));
        store.put(1, "one");
        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains(&1));
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::CacheStats;

/// Global registry for cache statistics.
///
/// Functions memoized with `#[memoize(scope = "global")]` register their
/// statistics here under their name (or the `name` attribute) on first call,
/// so they can be queried without access to the cache itself.
///
/// # Examples
///
/// ```
/// use memoria_core::stats_registry;
///
/// if let Some(stats) = stats_registry::get("my_function") {
///     println!("Hits: {}", stats.hits());
///     println!("Misses: {}", stats.misses());
/// }
///
/// for name in stats_registry::list() {
///     println!("Function: {}", name);
/// }
/// ```
static STATS_REGISTRY: Lazy<RwLock<HashMap<String, Arc<CacheStats>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a cache's statistics under `name`, replacing any previous entry.
pub fn register(name: &str, stats: Arc<CacheStats>) {
    tracing::debug!(cache = name, "registering cache statistics");
    STATS_REGISTRY.write().insert(name.to_string(), stats);
}

/// Returns a snapshot of the statistics registered under `name`.
pub fn get(name: &str) -> Option<CacheStats> {
    STATS_REGISTRY.read().get(name).map(|stats| (**stats).clone())
}

/// Returns the live statistics registered under `name`.
pub fn get_shared(name: &str) -> Option<Arc<CacheStats>> {
    STATS_REGISTRY.read().get(name).cloned()
}

/// Lists all registered names.
pub fn list() -> Vec<String> {
    STATS_REGISTRY.read().keys().cloned().collect()
}

/// Removes all entries from the registry. The statistics themselves are not reset.
pub fn clear() {
    STATS_REGISTRY.write().clear();
}

/// Resets the counters registered under `name`.
///
/// Returns `false` if no cache with that name is registered.
pub fn reset(name: &str) -> bool {
    match STATS_REGISTRY.read().get(name) {
        Some(stats) => {
            stats.reset();
            true
        }
        None => false,
    }
}

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::CacheStats;

/// Process-wide registry of cache statistics, indexed by name.
///
/// Caches are single-threaded, but their [`CacheStats`] live behind an `Arc`.
/// Registering that handle lets any thread inspect hit rates and eviction
/// counts without touching the cache itself.
///
/// # Examples
///
/// ```
/// use evicta_core::{stats_registry, EvictionCache, LruCache};
///
/// let mut cache = LruCache::new(2).unwrap();
/// stats_registry::register("sessions", cache.stats());
///
/// cache.put("a", 1);
/// let _ = cache.get(&"a");
/// let _ = cache.get(&"b");
///
/// let stats = stats_registry::get("sessions").unwrap();
/// assert_eq!(stats.hits(), 1);
/// assert_eq!(stats.misses(), 1);
/// # stats_registry::clear();
/// ```
static STATS_REGISTRY: Lazy<RwLock<HashMap<String, Arc<CacheStats>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a cache's statistics under `name`, replacing any previous entry.
pub fn register(name: &str, stats: &Arc<CacheStats>) {
    let mut registry = STATS_REGISTRY.write();
    registry.insert(name.to_string(), Arc::clone(stats));
}

/// Returns a point-in-time snapshot of the statistics registered as `name`.
pub fn get(name: &str) -> Option<CacheStats> {
    let registry = STATS_REGISTRY.read();
    registry.get(name).map(|stats| (**stats).clone())
}

/// Returns the live, shared statistics registered as `name`.
pub fn get_ref(name: &str) -> Option<Arc<CacheStats>> {
    let registry = STATS_REGISTRY.read();
    registry.get(name).cloned()
}

/// Lists all registered names.
pub fn list() -> Vec<String> {
    let registry = STATS_REGISTRY.read();
    registry.keys().cloned().collect()
}

/// Removes every registration; the statistics themselves are left untouched.
pub fn clear() {
    let mut registry = STATS_REGISTRY.write();
    registry.clear();
}

/// Resets the counters registered as `name`.
///
/// Returns `false` when nothing is registered under that name.
pub fn reset(name: &str) -> bool {
    let registry = STATS_REGISTRY.read();
    if let Some(stats) = registry.get(name) {
        stats.reset();
        true
    } else {
        false
    }
}

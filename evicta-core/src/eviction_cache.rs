use std::fmt;
#[cfg(feature = "stats")]
use std::sync::Arc;

#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{ConfigError, Entry};

/// Callback invoked for every entry that leaves a cache because of capacity
/// pressure.
///
/// The callback runs synchronously inside the mutating call that triggered
/// the eviction (`put`, `evict` or a shrinking `resize`). It must not call
/// back into the same cache instance; nothing guards against that, and the
/// borrow checker only catches it when the cache is not shared through
/// interior mutability.
pub type OnEvict<K, V> = Box<dyn FnMut(&K, &V)>;

/// The operations every eviction policy in this crate supports.
///
/// Policies are interchangeable behind `Box<dyn EvictionCache<K, V>>`; see
/// [`EvictionPolicy::build`](crate::EvictionPolicy::build).
///
/// # Contract
///
/// * `len() <= cap()` holds after every call.
/// * `on_evict` fires exactly once per entry displaced by capacity pressure
///   and never for `remove` or `clear`. [`clear_with_notify`] reports every
///   dropped entry as an eviction.
/// * `peek` and `contains` never change eviction order.
///
/// [`clear_with_notify`]: EvictionCache::clear_with_notify
///
/// None of the implementations are thread-safe. Wrap a cache in a lock if it
/// has to be shared.
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, LruCache};
///
/// fn warm<C: EvictionCache<u32, String>>(cache: &mut C) {
///     for i in 0..4 {
///         cache.put(i, format!("v{}", i));
///     }
/// }
///
/// let mut cache = LruCache::new(3).unwrap();
/// warm(&mut cache);
/// assert_eq!(cache.len(), 3);
/// assert!(!cache.contains(&0));
/// ```
pub trait EvictionCache<K, V> {
    /// Inserts or updates `key`.
    ///
    /// Returns the entry that was pushed out to make room, if any. The
    /// `on_evict` callback has already seen it by the time it is returned.
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>>;

    /// Looks up `key`, recording the access for the policy.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without touching the policy state.
    fn peek(&self, key: &K) -> Option<&V>;

    fn contains(&self, key: &K) -> bool;

    /// Removes `key` without firing `on_evict`.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes the entry the policy values least, firing `on_evict`.
    ///
    /// Returns `None` when the cache is empty.
    fn evict(&mut self) -> Option<Entry<K, V>>;

    /// Drops every entry, plus any ghost or frequency history, silently.
    fn clear(&mut self);

    /// Like [`clear`](Self::clear), but every resident entry is evicted
    /// first, in policy order, so `on_evict` and the eviction counter see
    /// each one exactly once.
    fn clear_with_notify(&mut self) {
        while self.evict().is_some() {}
        self.clear();
    }

    /// Changes the capacity, evicting entries if the cache has to shrink.
    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError>;

    fn len(&self) -> usize;

    fn cap(&self) -> usize;

    fn is_full(&self) -> bool {
        self.len() >= self.cap()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Installs (or replaces) the eviction callback.
    fn set_on_evict(&mut self, on_evict: OnEvict<K, V>);

    /// Shared hit/miss/eviction counters for this cache.
    #[cfg(feature = "stats")]
    fn stats(&self) -> &Arc<CacheStats>;
}

/// Eviction callback and statistics shared by every policy implementation.
pub(crate) struct Notifier<K, V> {
    on_evict: Option<OnEvict<K, V>>,
    #[cfg(feature = "stats")]
    stats: Arc<CacheStats>,
}

impl<K, V> Notifier<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            on_evict: None,
            #[cfg(feature = "stats")]
            stats: Arc::new(CacheStats::new()),
        }
    }

    pub(crate) fn set_on_evict(&mut self, on_evict: OnEvict<K, V>) {
        self.on_evict = Some(on_evict);
    }

    /// Records the outcome of a lookup.
    #[inline]
    pub(crate) fn access(&self, hit: bool) {
        #[cfg(feature = "stats")]
        {
            if hit {
                self.stats.record_hit();
            } else {
                self.stats.record_miss();
            }
        }
        #[cfg(not(feature = "stats"))]
        let _ = hit;
    }

    /// Reports a capacity eviction and hands the entry back.
    pub(crate) fn evicted(&mut self, entry: Entry<K, V>) -> Entry<K, V> {
        #[cfg(feature = "stats")]
        self.stats.record_eviction();
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&entry.key, &entry.value);
        }
        entry
    }

    #[cfg(feature = "stats")]
    pub(crate) fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }
}

impl<K, V> fmt::Debug for Notifier<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Notifier");
        s.field("on_evict", &self.on_evict.is_some());
        #[cfg(feature = "stats")]
        s.field("stats", &self.stats);
        s.finish()
    }
}

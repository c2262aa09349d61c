use std::hash::Hash;
#[cfg(feature = "stats")]
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::check_capacity;
use crate::eviction_cache::Notifier;
use crate::utils::split_segments;
#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{ConfigError, Entry, EvictionCache, LruCache, OnEvict};

/// Share of the capacity reserved for the protected segment by default.
pub const DEFAULT_PROTECTED_RATIO: f64 = 0.8;

/// Segmented LRU cache.
///
/// New keys land in the *probation* segment. A second access (a `get` hit or
/// a repeated `put`) promotes the key to the *protected* segment. When the
/// protected segment is full its oldest entry is demoted back to probation
/// rather than dropped, so a key has to be seen twice before it can push
/// anything out of the cache for good.
///
/// Capacity evictions always drain probation first. Probation is allowed to
/// grow into protected slots that are not in use yet, so a freshly filled
/// cache holds `capacity` entries even if nothing was promoted.
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, SegmentedCache};
///
/// let mut cache = SegmentedCache::new(5).unwrap();
/// for key in 1..=5 {
///     cache.put(key, key * 10);
/// }
///
/// // second access promotes key 1 out of probation
/// cache.get(&1);
/// assert!(cache.is_protected(&1));
///
/// let evicted = cache.put(6, 60).unwrap();
/// assert_eq!(evicted.key, 2);
/// assert!(cache.contains(&1));
/// ```
#[derive(Debug)]
pub struct SegmentedCache<K, V> {
    probation: LruCache<K, V>,
    protected: LruCache<K, V>,
    capacity: usize,
    protected_ratio: f64,
    notifier: Notifier<K, V>,
}

impl<K, V> SegmentedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache with the default 80% protected share.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_protected_ratio(capacity, DEFAULT_PROTECTED_RATIO)
    }

    /// Creates a cache whose protected segment holds `round(capacity * ratio)`
    /// entries, leaving at least one slot for probation.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidRatio`] if `ratio` is not strictly between 0 and 1.
    /// * [`ConfigError::ZeroCapacity`] or [`ConfigError::CapacityTooSmall`] if
    ///   either segment would end up empty.
    pub fn with_protected_ratio(capacity: usize, ratio: f64) -> Result<Self, ConfigError> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::InvalidRatio {
                name: "protected_ratio",
                value: ratio,
            });
        }
        let (probation_cap, protected_cap) = checked_split(capacity, ratio)?;
        debug!(capacity, probation_cap, protected_cap, "created segmented cache");

        Ok(Self {
            probation: LruCache::new(capacity)?,
            protected: LruCache::new(protected_cap)?,
            capacity,
            protected_ratio: ratio,
            notifier: Notifier::new(),
        })
    }

    pub fn with_on_evict<F>(mut self, on_evict: F) -> Self
    where
        F: FnMut(&K, &V) + 'static,
    {
        self.notifier.set_on_evict(Box::new(on_evict));
        self
    }

    /// Returns the entry [`evict`](EvictionCache::evict) would remove, but
    /// only once the cache is full.
    ///
    /// While there is free room nothing has to give way, so this is `None`.
    pub fn victim(&self) -> Option<(&K, &V)> {
        if !self.is_full() {
            return None;
        }
        self.probation
            .peek_lru()
            .or_else(|| self.protected.peek_lru())
    }

    pub fn probation_len(&self) -> usize {
        self.probation.len()
    }

    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    pub fn protected_capacity(&self) -> usize {
        self.protected.cap()
    }

    /// Returns `true` if `key` has been promoted to the protected segment.
    pub fn is_protected(&self, key: &K) -> bool {
        self.protected.contains(key)
    }

    /// Iterates probation entries, then protected ones, each oldest first.
    ///
    /// This is the order in which repeated [`evict`](EvictionCache::evict)
    /// calls would drain the cache.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.probation.iter().chain(self.protected.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Removes the entry `evict` would take, without notifying anyone.
    pub(crate) fn pop_victim(&mut self) -> Option<Entry<K, V>> {
        self.probation
            .pop_lru()
            .or_else(|| self.protected.pop_lru())
    }

    /// Moves an entry that just left probation into the protected segment.
    fn promote(&mut self, key: K, value: V) {
        if self.protected.is_full() {
            if let Some(demoted) = self.protected.pop_lru() {
                trace!(policy = "slru", "demoted protected entry to probation");
                self.probation.put(demoted.key, demoted.value);
            }
        }
        self.protected.put(key, value);
    }
}

/// Splits `capacity` for `ratio`, rejecting layouts with an empty segment.
fn checked_split(capacity: usize, ratio: f64) -> Result<(usize, usize), ConfigError> {
    check_capacity(capacity)?;
    let (probation, protected) = split_segments(capacity, ratio);
    if probation == 0 || protected == 0 {
        let minimum = ((0.5 / ratio).ceil() as usize).max(2);
        return Err(ConfigError::CapacityTooSmall {
            policy: "slru",
            capacity,
            minimum,
        });
    }
    Ok((probation, protected))
}

impl<K, V> EvictionCache<K, V> for SegmentedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        if self.protected.contains(&key) {
            self.protected.put(key, value);
            return None;
        }
        if self.probation.remove(&key).is_some() {
            self.promote(key, value);
            return None;
        }

        let evicted = if self.is_full() { self.evict() } else { None };
        self.probation.put(key, value);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.protected.contains(key) {
            self.notifier.access(true);
            return self.protected.get(key);
        }
        let Some(value) = self.probation.remove(key) else {
            self.notifier.access(false);
            return None;
        };
        self.notifier.access(true);
        self.promote(key.clone(), value);
        self.protected.peek(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.protected
            .peek(key)
            .or_else(|| self.probation.peek(key))
    }

    fn contains(&self, key: &K) -> bool {
        self.protected.contains(key) || self.probation.contains(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.probation
            .remove(key)
            .or_else(|| self.protected.remove(key))
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        let entry = self.pop_victim()?;
        trace!(policy = "slru", "evicted entry");
        Some(self.notifier.evicted(entry))
    }

    fn clear(&mut self) {
        self.probation.clear();
        self.protected.clear();
        debug!(policy = "slru", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        let (_, protected_cap) = checked_split(capacity, self.protected_ratio)?;

        while self.len() > capacity {
            self.evict();
        }
        self.probation.resize(capacity)?;
        while self.protected.len() > protected_cap {
            match self.protected.pop_lru() {
                Some(demoted) => {
                    self.probation.put(demoted.key, demoted.value);
                }
                None => break,
            }
        }
        self.protected.resize(protected_cap)?;

        debug!(policy = "slru", from = self.capacity, to = capacity, protected_cap, "resized cache");
        self.capacity = capacity;
        Ok(())
    }

    fn len(&self) -> usize {
        self.probation.len() + self.protected.len()
    }

    fn cap(&self) -> usize {
        self.capacity
    }

    fn set_on_evict(&mut self, on_evict: OnEvict<K, V>) {
        self.notifier.set_on_evict(on_evict);
    }

    #[cfg(feature = "stats")]
    fn stats(&self) -> &Arc<CacheStats> {
        self.notifier.stats()
    }
}

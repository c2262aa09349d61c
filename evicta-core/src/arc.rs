use std::hash::Hash;
#[cfg(feature = "stats")]
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::check_capacity;
use crate::eviction_cache::Notifier;
#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{ConfigError, Entry, EvictionCache, LfuCache, LruCache, OnEvict};

/// Adaptive Replacement Cache.
///
/// Resident entries live in two lists:
///
/// * `T1`, an LRU of keys seen once,
/// * `T2`, an LFU of keys seen at least twice.
///
/// Keys evicted from either list are remembered in a ghost list, `B1` or
/// `B2`. Ghosts keep the key only: a ghost hit adapts `p` and the caller
/// supplies the value again, so the evicted value is never read back and is
/// dropped once `on_evict` has seen it. A miss that hits `B1` means recency entries were
/// dropped too early and grows the target size `p` of `T1`; a hit in `B2`
/// shrinks it in favour of `T2`. Capacity evictions take from `T1` while it
/// is larger than `p`, otherwise from `T2`.
///
/// # Examples
///
/// ```
/// use evicta_core::{ArcCache, EvictionCache};
///
/// let mut cache = ArcCache::new(3).unwrap();
/// cache.put(11, 5);
/// cache.put(22, 6);
/// cache.put(33, 7);
/// cache.get(&11);
/// cache.put(44, 8);
///
/// assert_eq!(cache.get(&22), None);
/// assert_eq!(cache.get(&11), Some(&5));
/// assert_eq!(cache.get(&44), Some(&8));
/// assert_eq!(cache.ghost_lens(), (1, 0));
/// ```
#[derive(Debug)]
pub struct ArcCache<K, V> {
    t1: LruCache<K, V>,
    t2: LfuCache<K, V>,
    b1: LruCache<K, ()>,
    b2: LruCache<K, ()>,
    p: usize,
    capacity: usize,
    notifier: Notifier<K, V>,
}

impl<K, V> ArcCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Each ghost list remembers up to `capacity` keys as well.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        check_capacity(capacity)?;
        debug!(capacity, "created arc cache");
        Ok(Self {
            t1: LruCache::new(capacity)?,
            t2: LfuCache::new(capacity)?,
            b1: LruCache::new(capacity)?,
            b2: LruCache::new(capacity)?,
            p: 0,
            capacity,
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

    /// Current target size of the recency list `T1`.
    pub fn recency_target(&self) -> usize {
        self.p
    }

    /// Number of keys remembered by the ghost lists, as `(B1, B2)`.
    pub fn ghost_lens(&self) -> (usize, usize) {
        (self.b1.len(), self.b2.len())
    }

    /// Iterates resident entries: `T1` oldest first, then `T2` from its
    /// eviction end. Ghost keys are not included.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.t1.iter().chain(self.t2.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Evicts from `T1` or `T2` depending on the adaptive target.
    ///
    /// On a tie (`|T1| == p`) `T1` gives way only when `prefer_t1_on_tie`
    /// is set.
    fn replace(&mut self, prefer_t1_on_tie: bool) -> Option<Entry<K, V>> {
        let n = self.t1.len();
        let from_t1 = n > 0
            && (n > self.p || (n == self.p && prefer_t1_on_tie) || self.t2.is_empty());

        let entry = if from_t1 {
            let entry = self.t1.pop_lru()?;
            self.b1.put(entry.key.clone(), ());
            trace!(policy = "arc", list = "t1", p = self.p, "evicted entry");
            entry
        } else {
            let entry = self.t2.pop_lfu()?;
            self.b2.put(entry.key.clone(), ());
            trace!(policy = "arc", list = "t2", p = self.p, "evicted entry");
            entry
        };
        Some(self.notifier.evicted(entry))
    }

    fn replace_if_full(&mut self, prefer_t1_on_tie: bool) -> Option<Entry<K, V>> {
        if self.is_full() {
            self.replace(prefer_t1_on_tie)
        } else {
            None
        }
    }
}

impl<K, V> EvictionCache<K, V> for ArcCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        if self.t1.remove(&key).is_some() {
            self.t2.put(key, value);
            return None;
        }
        if self.t2.contains(&key) {
            self.t2.put(key, value);
            return None;
        }

        if self.b1.contains(&key) {
            let delta = (self.b2.len() / self.b1.len()).max(1);
            self.p = (self.p + delta).min(self.capacity);
            trace!(policy = "arc", p = self.p, "ghost hit in b1");

            let evicted = self.replace_if_full(false);
            self.b1.remove(&key);
            self.t2.put(key, value);
            return evicted;
        }

        if self.b2.contains(&key) {
            let delta = (self.b1.len() / self.b2.len()).max(1);
            self.p = self.p.saturating_sub(delta);
            trace!(policy = "arc", p = self.p, "ghost hit in b2");

            let evicted = self.replace_if_full(true);
            self.b2.remove(&key);
            self.t2.put(key, value);
            return evicted;
        }

        let evicted = self.replace_if_full(false);
        if self.b1.len() > self.capacity - self.p {
            self.b1.pop_lru();
        }
        if self.b2.len() > self.p {
            self.b2.pop_lru();
        }
        self.t1.put(key, value);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(value) = self.t1.remove(key) {
            self.notifier.access(true);
            self.t2.put(key.clone(), value);
            return self.t2.peek(key);
        }
        if self.t2.contains(key) {
            self.notifier.access(true);
            return self.t2.get(key);
        }
        self.notifier.access(false);
        None
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.t1.peek(key).or_else(|| self.t2.peek(key))
    }

    fn contains(&self, key: &K) -> bool {
        self.t1.contains(key) || self.t2.contains(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.b1.remove(key);
        self.b2.remove(key);
        self.t1.remove(key).or_else(|| self.t2.remove(key))
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        self.replace(false)
    }

    fn clear(&mut self) {
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
        debug!(policy = "arc", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        check_capacity(capacity)?;
        while self.len() > capacity {
            if self.replace(false).is_none() {
                break;
            }
        }
        self.t1.resize(capacity)?;
        self.t2.resize(capacity)?;
        while self.b1.len() > capacity {
            self.b1.pop_lru();
        }
        while self.b2.len() > capacity {
            self.b2.pop_lru();
        }
        self.b1.resize(capacity)?;
        self.b2.resize(capacity)?;
        self.p = self.p.min(capacity);

        debug!(policy = "arc", from = self.capacity, to = capacity, "resized cache");
        self.capacity = capacity;
        Ok(())
    }

    fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
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

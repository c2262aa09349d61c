use std::collections::HashMap;
use std::hash::Hash;
#[cfg(feature = "stats")]
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::check_capacity;
use crate::eviction_cache::Notifier;
#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{ConfigError, Entry, EvictionCache, OnEvict};

/// Fewest entries an eviction looks at.
pub const MIN_SAMPLES: usize = 5;

#[derive(Debug)]
struct Slot<K, V> {
    entry: Entry<K, V>,
    last_access: u64,
}

/// Approximate LRU that evicts by sampling.
///
/// There is no recency list to maintain: each entry carries a logical access
/// timestamp, and an eviction draws `samples` random entries and removes the
/// stalest of them. Reads and writes are a hash lookup plus a counter bump.
/// When the cache holds no more entries than the sample size every entry is
/// inspected, which makes the choice exact.
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, SampledLruCache};
///
/// let mut cache = SampledLruCache::with_seed(5, 42).unwrap();
/// for key in 0..5 {
///     cache.put(key, key);
/// }
/// for key in 1..5 {
///     cache.get(&key);
/// }
///
/// let evicted = cache.put(5, 5).unwrap();
/// assert_eq!(evicted.key, 0);
/// ```
#[derive(Debug)]
pub struct SampledLruCache<K, V> {
    slots: Vec<Slot<K, V>>,
    index: HashMap<K, usize>,
    clock: u64,
    samples: usize,
    capacity: usize,
    rng: fastrand::Rng,
    notifier: Notifier<K, V>,
}

impl<K, V> SampledLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache sampling [`MIN_SAMPLES`] entries per eviction.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SamplesExceedCapacity`] when `capacity < MIN_SAMPLES`.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_seed(capacity, fastrand::u64(..))
    }

    /// Like [`new`](Self::new), with a reproducible sampling sequence.
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self, ConfigError> {
        check_capacity(capacity)?;
        if capacity < MIN_SAMPLES {
            return Err(ConfigError::SamplesExceedCapacity {
                samples: MIN_SAMPLES,
                capacity,
            });
        }
        debug!(capacity, samples = MIN_SAMPLES, "created sampled lru cache");
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            clock: 0,
            samples: MIN_SAMPLES,
            capacity,
            rng: fastrand::Rng::with_seed(seed),
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

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Iterates resident entries in storage order, which is unrelated to
    /// recency.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .map(|slot| (&slot.entry.key, &slot.entry.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Sets how many entries an eviction inspects.
    ///
    /// Values below [`MIN_SAMPLES`] are raised to it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SamplesExceedCapacity`] if the sample count would exceed
    /// the capacity. The previous setting is kept.
    pub fn set_samples(&mut self, samples: usize) -> Result<(), ConfigError> {
        let samples = samples.max(MIN_SAMPLES);
        if samples > self.capacity {
            return Err(ConfigError::SamplesExceedCapacity {
                samples,
                capacity: self.capacity,
            });
        }
        self.samples = samples;
        Ok(())
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Picks the stalest entry among a random sample.
    fn pick_victim(&mut self) -> Option<usize> {
        let len = self.slots.len();
        if len == 0 {
            return None;
        }
        if len <= self.samples {
            return (0..len).min_by_key(|&idx| self.slots[idx].last_access);
        }

        let mut best = self.rng.usize(..len);
        for _ in 1..self.samples {
            let idx = self.rng.usize(..len);
            if self.slots[idx].last_access < self.slots[best].last_access {
                best = idx;
            }
        }
        Some(best)
    }

    fn remove_at(&mut self, idx: usize) -> Entry<K, V> {
        let slot = self.slots.swap_remove(idx);
        self.index.remove(&slot.entry.key);
        if let Some(moved) = self.slots.get(idx) {
            if let Some(position) = self.index.get_mut(&moved.entry.key) {
                *position = idx;
            }
        }
        slot.entry
    }
}

impl<K, V> EvictionCache<K, V> for SampledLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        let now = self.tick();
        if let Some(&idx) = self.index.get(&key) {
            let slot = &mut self.slots[idx];
            slot.entry.value = value;
            slot.last_access = now;
            return None;
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        self.index.insert(key.clone(), self.slots.len());
        self.slots.push(Slot {
            entry: Entry::new(key, value),
            last_access: now,
        });
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&idx) = self.index.get(key) else {
            self.notifier.access(false);
            return None;
        };
        self.notifier.access(true);
        let now = self.tick();
        let slot = &mut self.slots[idx];
        slot.last_access = now;
        Some(&slot.entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots.get(idx).map(|slot| &slot.entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = *self.index.get(key)?;
        Some(self.remove_at(idx).value)
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        let idx = self.pick_victim()?;
        let entry = self.remove_at(idx);
        trace!(policy = "sampled_lru", "evicted sampled entry");
        Some(self.notifier.evicted(entry))
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.clock = 0;
        debug!(policy = "sampled_lru", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        check_capacity(capacity)?;
        if self.samples > capacity {
            return Err(ConfigError::SamplesExceedCapacity {
                samples: self.samples,
                capacity,
            });
        }
        while self.slots.len() > capacity {
            self.evict();
        }
        debug!(policy = "sampled_lru", from = self.capacity, to = capacity, "resized cache");
        self.capacity = capacity;
        Ok(())
    }

    fn len(&self) -> usize {
        self.slots.len()
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

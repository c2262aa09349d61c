use std::hash::Hash;
#[cfg(feature = "stats")]
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::check_capacity;
use crate::eviction_cache::Notifier;
use crate::slru::DEFAULT_PROTECTED_RATIO;
use crate::utils::{split_segments, window_capacity};
#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{
    ConfigError, DefaultKeyHasher, Entry, EvictionCache, FrequencySketch, KeyHasher, LruCache,
    MembershipFilter, OnEvict, SegmentedCache,
};

/// Share of the capacity given to the admission window.
pub const WINDOW_RATIO: f64 = 0.01;

/// Overcount the frequency sketch tolerates.
pub const SKETCH_ERROR_RANGE: u8 = 1;

/// Probability of the sketch exceeding [`SKETCH_ERROR_RANGE`].
pub const SKETCH_ERROR_RATE: f64 = 0.01;

/// False-positive rate of the doorkeeper filter.
pub const FILTER_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Accesses per cached entry between two aging passes.
pub const SAMPLES_FACTOR: usize = 8;

/// Smallest capacity that leaves room for a window slot and a valid main cache.
pub const MIN_CAPACITY: usize = 3;

/// Window TinyLFU cache.
///
/// New entries go to a small LRU *window*. When the window overflows, its
/// oldest entry (the candidate) has to win a frequency contest against the
/// entry the main [`SegmentedCache`] would evict next (the victim). The
/// candidate is admitted only if it has been seen strictly more often; ties
/// keep the incumbent.
///
/// Frequencies come from a 4-bit [`FrequencySketch`] guarded by a
/// [`MembershipFilter`] doorkeeper, so a key only starts counting in the
/// sketch on its second access. Every `8 * capacity` accesses the filter is
/// reset and the sketch halved, letting old popularity fade.
///
/// Keys are hashed with a [`KeyHasher`], [`DefaultKeyHasher`] unless another
/// is supplied.
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, TinyLfuCache};
///
/// let mut cache = TinyLfuCache::with_seed(3, 17).unwrap();
/// cache.put(11, "a");
/// cache.put(22, "b");
/// cache.put(33, "c");
/// cache.get(&11);
///
/// // 33 spills out of the window and loses the tie against 22
/// let discarded = cache.put(44, "d").unwrap();
/// assert_eq!(discarded.key, 33);
/// assert!(cache.contains(&11));
/// ```
#[derive(Debug)]
pub struct TinyLfuCache<K, V, H = DefaultKeyHasher> {
    window: LruCache<K, V>,
    main: SegmentedCache<K, V>,
    sketch: FrequencySketch,
    filter: MembershipFilter,
    hasher: H,
    seed: u64,
    samples: usize,
    samples_threshold: usize,
    capacity: usize,
    notifier: Notifier<K, V>,
}

/// Returns `(window, main)` capacities, or the reason `capacity` cannot be split.
fn layout(capacity: usize) -> Result<(usize, usize), ConfigError> {
    check_capacity(capacity)?;
    let window = window_capacity(capacity, WINDOW_RATIO);
    let main = capacity.saturating_sub(window);
    let (probation, protected) = split_segments(main, DEFAULT_PROTECTED_RATIO);
    if probation == 0 || protected == 0 {
        return Err(ConfigError::CapacityTooSmall {
            policy: "tinylfu",
            capacity,
            minimum: MIN_CAPACITY,
        });
    }
    Ok((window, main))
}

impl<K, V> TinyLfuCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache hashing keys with [`DefaultKeyHasher`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::CapacityTooSmall`] below [`MIN_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_hasher(capacity, DefaultKeyHasher)
    }

    /// Like [`new`](Self::new), with the sketch and filter seeds pinned.
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::with_hasher_and_seed(capacity, DefaultKeyHasher, seed)
    }
}

impl<K, V, H> TinyLfuCache<K, V, H>
where
    K: Hash + Eq + Clone,
    H: KeyHasher<K>,
{
    pub fn with_hasher(capacity: usize, hasher: H) -> Result<Self, ConfigError> {
        Self::with_hasher_and_seed(capacity, hasher, fastrand::u64(..))
    }

    pub fn with_hasher_and_seed(capacity: usize, hasher: H, seed: u64) -> Result<Self, ConfigError> {
        let (window_cap, main_cap) = layout(capacity)?;
        debug!(capacity, window_cap, main_cap, "created tinylfu cache");

        Ok(Self {
            window: LruCache::new(window_cap)?,
            main: SegmentedCache::new(main_cap)?,
            sketch: FrequencySketch::with_seed(
                capacity,
                SKETCH_ERROR_RANGE,
                SKETCH_ERROR_RATE,
                seed,
            )?,
            filter: MembershipFilter::with_seed(capacity, FILTER_FALSE_POSITIVE_RATE, seed)?,
            hasher,
            seed,
            samples: 0,
            samples_threshold: SAMPLES_FACTOR * capacity,
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

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn main_len(&self) -> usize {
        self.main.len()
    }

    /// Iterates window entries oldest first, then the main cache in
    /// [`SegmentedCache::iter`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.window.iter().chain(self.main.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Estimated access frequency of `key` as used by the admission contest.
    pub fn frequency(&self, key: &K) -> u32 {
        self.estimate(self.hasher.hash_key(key))
    }

    fn estimate(&self, hash: u64) -> u32 {
        u32::from(self.sketch.estimate(hash)) + u32::from(self.filter.contains(hash))
    }

    fn record_access(&mut self, hash: u64) {
        self.samples += 1;
        if self.samples >= self.samples_threshold {
            self.filter.clear();
            self.sketch.attenuation(2);
            self.samples = 0;
            debug!(policy = "tinylfu", "aged frequency sketch");
        }

        if self.filter.contains(hash) {
            self.sketch.add(hash, 1);
        } else {
            self.filter.add(hash);
        }
    }

    /// Runs the admission contest for an entry that spilled out of the window.
    ///
    /// Returns whichever entry lost, after notifying about it.
    fn admit(&mut self, candidate: Entry<K, V>) -> Option<Entry<K, V>> {
        let victim_hash = match self.main.victim() {
            Some((victim_key, _)) => self.hasher.hash_key(victim_key),
            None => {
                self.main.put(candidate.key, candidate.value);
                return None;
            }
        };

        let candidate_freq = self.frequency(&candidate.key);
        let victim_freq = self.estimate(victim_hash);

        if candidate_freq > victim_freq {
            let victim = self.main.pop_victim()?;
            self.main.put(candidate.key, candidate.value);
            trace!(policy = "tinylfu", candidate_freq, victim_freq, "admitted candidate");
            Some(self.notifier.evicted(victim))
        } else {
            trace!(policy = "tinylfu", candidate_freq, victim_freq, "rejected candidate");
            Some(self.notifier.evicted(candidate))
        }
    }
}

impl<K, V, H> EvictionCache<K, V> for TinyLfuCache<K, V, H>
where
    K: Hash + Eq + Clone,
    H: KeyHasher<K>,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        let hash = self.hasher.hash_key(&key);
        self.record_access(hash);

        if self.window.contains(&key) {
            self.window.put(key, value);
            return None;
        }
        if self.main.contains(&key) {
            self.main.put(key, value);
            return None;
        }

        let candidate = if self.window.is_full() {
            self.window.pop_lru()
        } else {
            None
        };
        self.window.put(key, value);

        match candidate {
            Some(candidate) => self.admit(candidate),
            None => None,
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let hash = self.hasher.hash_key(key);
        self.record_access(hash);

        if self.window.contains(key) {
            self.notifier.access(true);
            return self.window.get(key);
        }
        if self.main.contains(key) {
            self.notifier.access(true);
            return self.main.get(key);
        }
        self.notifier.access(false);
        None
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.window.peek(key).or_else(|| self.main.peek(key))
    }

    fn contains(&self, key: &K) -> bool {
        self.window.contains(key) || self.main.contains(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.window.remove(key).or_else(|| self.main.remove(key))
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        let entry = self
            .main
            .pop_victim()
            .or_else(|| self.window.pop_lru())?;
        trace!(policy = "tinylfu", "evicted entry");
        Some(self.notifier.evicted(entry))
    }

    fn clear(&mut self) {
        self.window.clear();
        self.main.clear();
        self.sketch.clear();
        self.filter.clear();
        self.samples = 0;
        debug!(policy = "tinylfu", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        let (window_cap, main_cap) = layout(capacity)?;
        let sketch =
            FrequencySketch::with_seed(capacity, SKETCH_ERROR_RANGE, SKETCH_ERROR_RATE, self.seed)?;
        let filter = MembershipFilter::with_seed(capacity, FILTER_FALSE_POSITIVE_RATE, self.seed)?;

        while self.len() > capacity {
            self.evict();
        }
        while self.main.len() > main_cap {
            match self.main.pop_victim() {
                Some(entry) => {
                    self.notifier.evicted(entry);
                }
                None => break,
            }
        }
        self.main.resize(main_cap)?;

        while self.window.len() > window_cap {
            let Some(entry) = self.window.pop_lru() else {
                break;
            };
            if self.main.len() < main_cap {
                self.main.put(entry.key, entry.value);
            } else {
                self.notifier.evicted(entry);
            }
        }
        self.window.resize(window_cap)?;

        self.sketch = sketch;
        self.filter = filter;
        self.samples = 0;
        self.samples_threshold = SAMPLES_FACTOR * capacity;

        debug!(policy = "tinylfu", from = self.capacity, to = capacity, window_cap, main_cap, "resized cache");
        self.capacity = capacity;
        Ok(())
    }

    fn len(&self) -> usize {
        self.window.len() + self.main.len()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(layout(3), Ok((1, 2)));
        assert_eq!(layout(100), Ok((1, 99)));
        assert_eq!(layout(1000), Ok((10, 990)));
        assert_eq!(layout(0), Err(ConfigError::ZeroCapacity));
        assert_eq!(
            layout(2),
            Err(ConfigError::CapacityTooSmall {
                policy: "tinylfu",
                capacity: 2,
                minimum: MIN_CAPACITY,
            })
        );
    }

    #[test]
    fn test_first_access_only_marks_doorkeeper() {
        let mut cache: TinyLfuCache<u64, u64, _> =
            TinyLfuCache::with_hasher_and_seed(100, |key: &u64| *key, 1).unwrap();
        cache.record_access(7);
        assert_eq!(cache.sketch.estimate(7), 0);
        assert_eq!(cache.frequency(&7), 1);

        cache.record_access(7);
        cache.record_access(7);
        assert_eq!(cache.sketch.estimate(7), 2);
        assert_eq!(cache.frequency(&7), 3);
    }

    #[test]
    fn test_aging_after_sample_threshold() {
        let mut cache: TinyLfuCache<u64, u64, _> =
            TinyLfuCache::with_hasher_and_seed(3, |key: &u64| *key, 1).unwrap();
        assert_eq!(cache.samples_threshold, 24);

        for _ in 0..10 {
            cache.record_access(5);
        }
        assert_eq!(cache.sketch.estimate(5), 9);

        for _ in 0..14 {
            cache.record_access(1000);
        }
        // the 24th access aged the sketch, then re-marked 1000 in the filter
        assert_eq!(cache.samples, 0);
        assert_eq!(cache.sketch.estimate(5), 4);
        assert!(!cache.filter.contains(5));
    }

    #[test]
    fn test_put_into_window_updates_in_place() {
        let mut cache = TinyLfuCache::with_seed(10, 3).unwrap();
        cache.put("a", 1);
        assert_eq!(cache.put("a", 2), None);
        assert_eq!(cache.window_len(), 1);
        assert_eq!(cache.peek(&"a"), Some(&2));
    }

    #[test]
    fn test_spill_goes_to_main_until_full() {
        let mut cache = TinyLfuCache::with_seed(10, 3).unwrap();
        for key in 0..10 {
            assert_eq!(cache.put(key, key), None);
        }
        assert_eq!(cache.window_len(), 1);
        assert_eq!(cache.main_len(), 9);
        assert!(cache.is_full());
    }

    #[test]
    fn test_evict_prefers_main() {
        let mut cache = TinyLfuCache::with_seed(3, 3).unwrap();
        cache.put(1, 1);
        cache.put(2, 2);
        cache.put(3, 3);

        assert_eq!(cache.evict().map(|e| e.key), Some(1));
        assert_eq!(cache.evict().map(|e| e.key), Some(2));
        assert_eq!(cache.evict().map(|e| e.key), Some(3));
        assert_eq!(cache.evict(), None);
    }

    #[test]
    fn test_clear_forgets_frequencies() {
        let mut cache = TinyLfuCache::with_seed(10, 3).unwrap();
        cache.put(1, 1);
        cache.get(&1);
        assert!(cache.frequency(&1) > 0);

        cache.clear();
        assert_eq!(cache.frequency(&1), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resize_rebalances_segments() {
        let mut cache = TinyLfuCache::with_seed(1000, 3).unwrap();
        for key in 0..1000 {
            cache.put(key, key);
        }
        assert_eq!(cache.window_len(), 10);

        cache.resize(100).unwrap();
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.window_len(), 1);
        assert_eq!(cache.main_len(), 99);
        assert!(cache.resize(2).is_err());
        assert_eq!(cache.cap(), 100);
    }
}

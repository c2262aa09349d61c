use std::hash::Hash;

use crate::{
    ArcCache, ConfigError, EvictionCache, LfuCache, LruCache, SampledLruCache, SegmentedCache,
    TinyLfuCache,
};

/// Selects an eviction policy at runtime.
///
/// Every policy implements [`EvictionCache`], so code written against the
/// trait can switch between them through configuration alone.
///
/// # Variants
///
/// * `Lru` - **Least Recently Used** (default)
///   - Evicts the entry untouched for the longest time
///   - Best for workloads with strong temporal locality
///
/// * `Lfu` - **Least Frequently Used** (approximate)
///   - Evicts the entry with the lowest access count, oldest among ties
///   - Keeps long-running favourites at the cost of adapting slowly
///
/// * `Slru` - **Segmented LRU**
///   - A key must be seen twice before it is protected from eviction
///   - Resists one-off scans that would flush a plain LRU
///
/// * `Arc` - **Adaptive Replacement Cache**
///   - Balances recency and frequency with a self-tuning split
///   - No parameters beyond capacity
///
/// * `TinyLfu` - **Window TinyLFU**
///   - Admission filter in front of an SLRU, driven by a frequency sketch
///   - Needs a capacity of at least 3
///
/// * `SampledLru` - **Sampled LRU**
///   - Evicts the stalest of a few random entries
///   - Needs a capacity of at least 5
///
/// # Examples
///
/// ```
/// use evicta_core::EvictionPolicy;
///
/// let policy: EvictionPolicy = "TinyLFU".into();
/// assert_eq!(policy, EvictionPolicy::TinyLfu);
///
/// let mut cache = policy.build::<String, u32>(100).unwrap();
/// cache.put("answer".to_string(), 42);
/// assert_eq!(cache.get(&"answer".to_string()), Some(&42));
/// ```
///
/// # Performance Characteristics
///
/// | Policy     | Get  | Put  | Evict      | Extra memory                    |
/// |------------|------|------|------------|---------------------------------|
/// | Lru        | O(1) | O(1) | O(1)       | list links                      |
/// | Lfu        | O(1) | O(1) | O(1)       | list links + counter            |
/// | Slru       | O(1) | O(1) | O(1)       | two lists                       |
/// | Arc        | O(1) | O(1) | O(1)       | ghost keys, up to 2x capacity   |
/// | TinyLfu    | O(h) | O(h) | O(1)       | sketch + bloom filter           |
/// | SampledLru | O(1) | O(s) | O(s)       | timestamp per entry             |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvictionPolicy {
    #[default]
    Lru,
    Lfu,
    Slru,
    Arc,
    TinyLfu,
    SampledLru,
}

impl EvictionPolicy {
    /// Every available policy, in declaration order.
    pub const ALL: [EvictionPolicy; 6] = [
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::Slru,
        EvictionPolicy::Arc,
        EvictionPolicy::TinyLfu,
        EvictionPolicy::SampledLru,
    ];

    /// Short lowercase name, as accepted by the `From<&str>` conversion.
    pub const fn name(self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Slru => "slru",
            EvictionPolicy::Arc => "arc",
            EvictionPolicy::TinyLfu => "tinylfu",
            EvictionPolicy::SampledLru => "sampled_lru",
        }
    }

    /// Smallest capacity this policy accepts with its default parameters.
    pub const fn min_capacity(self) -> usize {
        match self {
            EvictionPolicy::Lru | EvictionPolicy::Lfu | EvictionPolicy::Arc => 1,
            EvictionPolicy::Slru => 2,
            EvictionPolicy::TinyLfu => crate::tinylfu::MIN_CAPACITY,
            EvictionPolicy::SampledLru => crate::sampled_lru::MIN_SAMPLES,
        }
    }

    /// Builds a boxed cache of this policy with default parameters.
    ///
    /// # Errors
    ///
    /// Whatever the policy's constructor rejects, see [`min_capacity`](Self::min_capacity).
    pub fn build<K, V>(self, capacity: usize) -> Result<Box<dyn EvictionCache<K, V>>, ConfigError>
    where
        K: Hash + Eq + Clone + 'static,
        V: 'static,
    {
        let cache: Box<dyn EvictionCache<K, V>> = match self {
            EvictionPolicy::Lru => Box::new(LruCache::new(capacity)?),
            EvictionPolicy::Lfu => Box::new(LfuCache::new(capacity)?),
            EvictionPolicy::Slru => Box::new(SegmentedCache::new(capacity)?),
            EvictionPolicy::Arc => Box::new(ArcCache::new(capacity)?),
            EvictionPolicy::TinyLfu => Box::new(TinyLfuCache::new(capacity)?),
            EvictionPolicy::SampledLru => Box::new(SampledLruCache::new(capacity)?),
        };
        Ok(cache)
    }
}

/// Converts a string slice to an `EvictionPolicy`.
///
/// The conversion is case-insensitive and defaults to LRU for unrecognized values.
///
/// # Supported Values
///
/// - `"lru"` → `EvictionPolicy::Lru`
/// - `"lfu"` → `EvictionPolicy::Lfu`
/// - `"slru"` or `"segmented"` → `EvictionPolicy::Slru`
/// - `"arc"` → `EvictionPolicy::Arc`
/// - `"tinylfu"`, `"tiny_lfu"` or `"wtinylfu"` → `EvictionPolicy::TinyLfu`
/// - `"sampled_lru"`, `"sampledlru"` or `"nearly_lru"` → `EvictionPolicy::SampledLru`
/// - Any other value → `EvictionPolicy::Lru`
///
/// # Examples
///
/// ```
/// use evicta_core::EvictionPolicy;
///
/// let arc: EvictionPolicy = "ARC".into();
/// assert_eq!(arc, EvictionPolicy::Arc);
///
/// let unknown: EvictionPolicy = "random".into();
/// assert_eq!(unknown, EvictionPolicy::Lru);
/// ```
impl From<&str> for EvictionPolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lfu" => EvictionPolicy::Lfu,
            "slru" | "segmented" => EvictionPolicy::Slru,
            "arc" => EvictionPolicy::Arc,
            "tinylfu" | "tiny_lfu" | "wtinylfu" => EvictionPolicy::TinyLfu,
            "sampled_lru" | "sampledlru" | "nearly_lru" => EvictionPolicy::SampledLru,
            _ => EvictionPolicy::Lru,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lru() {
        assert_eq!(EvictionPolicy::default(), EvictionPolicy::Lru);
    }

    #[test]
    fn test_name_round_trips_through_from() {
        for policy in EvictionPolicy::ALL {
            assert_eq!(EvictionPolicy::from(policy.name()), policy);
            assert_eq!(
                EvictionPolicy::from(policy.name().to_uppercase().as_str()),
                policy
            );
        }
    }

    #[test]
    fn test_build_respects_min_capacity() {
        for policy in EvictionPolicy::ALL {
            let min = policy.min_capacity();
            assert!(policy.build::<u32, u32>(min).is_ok(), "{:?}", policy);
            assert!(policy.build::<u32, u32>(min - 1).is_err(), "{:?}", policy);
        }
    }

    #[test]
    fn test_built_caches_honour_capacity() {
        for policy in EvictionPolicy::ALL {
            let mut cache = policy.build::<u32, u32>(8).unwrap();
            for key in 0..100 {
                cache.put(key, key);
                assert!(cache.len() <= 8, "{:?}", policy);
            }
            assert!(cache.is_full());
        }
    }
}

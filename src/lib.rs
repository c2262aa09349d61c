//! # Evicta
//!
//! Bounded in-memory caches with pluggable eviction policies.
//!
//! ## Features
//!
//! - **One trait, many policies**: LRU, LFU, SLRU, ARC, W-TinyLFU and sampled
//!   LRU all implement [`EvictionCache`]
//! - **O(1) operations**: arena-backed lists instead of pointer-linked nodes
//! - **Scan resistance**: segmented and admission-controlled policies keep hot
//!   keys resident through one-off bursts
//! - **Eviction callbacks**: observe every entry pushed out by capacity pressure
//! - **Statistics**: hit, miss and eviction counters, optionally published
//!   through a process-wide registry (feature `stats`, on by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use evicta::{EvictionCache, LruCache};
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//!
//! // "b" is the least recently used entry
//! let evicted = cache.put("c", 3).unwrap();
//! assert_eq!(evicted.key, "b");
//! ```
//!
//! ## Choosing a policy at runtime
//!
//! ```rust
//! use evicta::{EvictionCache, EvictionPolicy};
//!
//! let mut cache = evicta::from_config::<u64, String>("arc", 128).unwrap();
//! cache.put(1, "one".to_string());
//! assert!(cache.contains(&1));
//!
//! assert_eq!(EvictionPolicy::from("slru"), EvictionPolicy::Slru);
//! ```
//!
//! ## Eviction callbacks
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use evicta::{EvictionCache, TinyLfuCache};
//!
//! let evicted = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&evicted);
//!
//! let mut cache = TinyLfuCache::with_seed(3, 1)
//!     .unwrap()
//!     .with_on_evict(move |key: &u32, _value: &u32| sink.borrow_mut().push(*key));
//!
//! for key in 0..10 {
//!     cache.put(key, key);
//! }
//! assert_eq!(evicted.borrow().len(), 7);
//! ```
//!
//! ## Statistics
//!
//! ```rust
//! # #[cfg(feature = "stats")]
//! # {
//! use evicta::{stats_registry, EvictionCache, SegmentedCache};
//!
//! let mut cache = SegmentedCache::new(10).unwrap();
//! stats_registry::register("profiles", cache.stats());
//!
//! cache.put(1, "alice");
//! cache.get(&1);
//! cache.get(&2);
//!
//! let stats = stats_registry::get("profiles").unwrap();
//! assert_eq!(stats.hits(), 1);
//! assert_eq!(stats.misses(), 1);
//! # stats_registry::clear();
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Caches are single-threaded. Wrap one in a `Mutex` (or `parking_lot::Mutex`)
//! to share it, and keep eviction callbacks from calling back into the cache
//! that invoked them.

pub use evicta_core::*;

/// Builds a cache for the policy named by `policy`, with default parameters.
///
/// The name is parsed like [`EvictionPolicy::from`]: case-insensitive, with
/// unknown names falling back to LRU.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `capacity` is below the policy's minimum.
///
/// # Examples
///
/// ```
/// use evicta::EvictionCache;
///
/// let cache = evicta::from_config::<u32, u32>("tinylfu", 2);
/// assert!(cache.is_err());
///
/// let cache = evicta::from_config::<u32, u32>("lru", 2).unwrap();
/// assert_eq!(cache.cap(), 2);
/// ```
pub fn from_config<K, V>(
    policy: &str,
    capacity: usize,
) -> Result<Box<dyn EvictionCache<K, V>>, ConfigError>
where
    K: std::hash::Hash + Eq + Clone + 'static,
    V: 'static,
{
    EvictionPolicy::from(policy).build(capacity)
}

//! # Evicta Core
//!
//! Bounded in-memory caches with interchangeable eviction policies.
//!
//! Every cache implements the [`EvictionCache`] trait, so the policy can be
//! swapped without touching calling code, either statically or at runtime
//! through [`EvictionPolicy::build`].
//!
//! ## Policies
//!
//! - [`LruCache`] - least recently used
//! - [`LfuCache`] - approximate least frequently used, O(1) per operation
//! - [`SegmentedCache`] - segmented LRU with probation and protected segments
//! - [`ArcCache`] - Adaptive Replacement Cache with ghost lists
//! - [`TinyLfuCache`] - Window TinyLFU admission in front of an SLRU
//! - [`SampledLruCache`] - approximate LRU by random sampling
//!
//! ## Building blocks
//!
//! - [`OrderedList`] - arena-backed doubly linked list used by the list policies
//! - [`FrequencySketch`] - Count-Min sketch with 4-bit counters
//! - [`MembershipFilter`] - Bloom filter used as a doorkeeper
//!
//! ## Module Organization
//!
//! - [`eviction_cache`] - the shared trait and the eviction callback type
//! - [`eviction_policy`] - runtime policy selection
//! - [`stats_registry`] - process-wide access to cache statistics (feature `stats`)
//! - [`utils`] - hashing and capacity helpers
//!
//! ## Thread safety
//!
//! The caches are plain single-threaded data structures. Share one across
//! threads by wrapping it in a lock. Only [`CacheStats`] is safe to read
//! concurrently.
//!
//! ## Example
//!
//! ```
//! use evicta_core::{ArcCache, EvictionCache};
//!
//! let mut cache = ArcCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//!
//! let evicted = cache.put("c", 3).unwrap();
//! assert_eq!(evicted.key, "b");
//! ```
mod arc;
mod bloom;
mod cache_entry;
mod error;
mod hashing;
mod lfu;
mod lru;
mod ordered_list;
mod sampled_lru;
mod sketch;
mod slru;
mod tinylfu;

pub mod eviction_cache;
pub mod eviction_policy;
pub mod utils;

#[cfg(feature = "stats")]
mod stats;

#[cfg(feature = "stats")]
pub mod stats_registry;

pub use arc::ArcCache;
pub use bloom::MembershipFilter;
pub use cache_entry::Entry;
pub use error::ConfigError;
pub use eviction_cache::{EvictionCache, OnEvict};
pub use eviction_policy::EvictionPolicy;
pub use hashing::{BytesKeyHasher, DefaultKeyHasher, KeyHasher};
pub use lfu::LfuCache;
pub use lru::LruCache;
pub use ordered_list::{OrderedList, SlotId};
pub use sampled_lru::{SampledLruCache, MIN_SAMPLES};
pub use sketch::{FrequencySketch, COUNTERS_PER_WORD, COUNTER_BITS, COUNTER_MAX};
pub use slru::{SegmentedCache, DEFAULT_PROTECTED_RATIO};
pub use tinylfu::{
    TinyLfuCache, FILTER_FALSE_POSITIVE_RATE, MIN_CAPACITY as TINYLFU_MIN_CAPACITY,
    SAMPLES_FACTOR, SKETCH_ERROR_RANGE, SKETCH_ERROR_RATE, WINDOW_RATIO,
};

#[cfg(feature = "stats")]
pub use stats::CacheStats;

use std::collections::HashMap;
use std::hash::Hash;
#[cfg(feature = "stats")]
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::check_capacity;
use crate::eviction_cache::Notifier;
#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::{ConfigError, Entry, EvictionCache, OnEvict, OrderedList, SlotId};

/// Least-recently-used cache.
///
/// Entries are kept in an [`OrderedList`] from most to least recently used,
/// with a key index pointing at each node. Every operation is O(1).
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, LruCache};
///
/// let mut cache = LruCache::new(3).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3);
///
/// // touching "a" makes "b" the oldest entry
/// assert_eq!(cache.get(&"a"), Some(&1));
///
/// let evicted = cache.put("d", 4).unwrap();
/// assert_eq!(evicted.key, "b");
/// assert!(cache.contains(&"a"));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    map: HashMap<K, SlotId>,
    list: OrderedList<Entry<K, V>>,
    capacity: usize,
    notifier: Notifier<K, V>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        check_capacity(capacity)?;
        debug!(capacity, "created lru cache");
        Ok(Self {
            map: HashMap::with_capacity(capacity),
            list: OrderedList::with_capacity(capacity),
            capacity,
            notifier: Notifier::new(),
        })
    }

    /// Installs an eviction callback, builder style.
    pub fn with_on_evict<F>(mut self, on_evict: F) -> Self
    where
        F: FnMut(&K, &V) + 'static,
    {
        self.notifier.set_on_evict(Box::new(on_evict));
        self
    }

    /// Returns the entry that would be evicted next, without touching it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns the most recently used entry.
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.list.front().map(|entry| (&entry.key, &entry.value))
    }

    /// Iterates entries from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter_rev().map(|entry| (&entry.key, &entry.value))
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Values from least to most recently used.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Removes the least recently used entry without notifying anyone.
    ///
    /// Composite policies use this to move entries between their own
    /// segments; those moves are not evictions.
    pub(crate) fn pop_lru(&mut self) -> Option<Entry<K, V>> {
        let entry = self.list.pop_back()?;
        self.map.remove(&entry.key);
        Some(entry)
    }

    #[cfg(test)]
    pub(crate) fn debug_validate(&self) {
        self.list.debug_validate();
        assert_eq!(self.map.len(), self.list.len());
        assert!(self.list.len() <= self.capacity);
    }
}

impl<K, V> EvictionCache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        if let Some(&id) = self.map.get(&key) {
            self.list.move_to_front(id);
            if let Some(entry) = self.list.get_mut(id) {
                entry.value = value;
            }
            return None;
        }

        let evicted = if self.list.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let id = self.list.push_front(Entry::new(key.clone(), value));
        self.map.insert(key, id);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.map.get(key) else {
            self.notifier.access(false);
            return None;
        };
        self.notifier.access(true);
        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.map.get(key)?;
        self.list.get(id).map(|entry| &entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.map.remove(key)?;
        self.list.remove(id).map(|entry| entry.value)
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        let entry = self.pop_lru()?;
        trace!(policy = "lru", "evicted least recently used entry");
        Some(self.notifier.evicted(entry))
    }

    fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
        debug!(policy = "lru", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        check_capacity(capacity)?;
        while self.list.len() > capacity {
            self.evict();
        }
        debug!(policy = "lru", from = self.capacity, to = capacity, "resized cache");
        self.capacity = capacity;
        Ok(())
    }

    fn len(&self) -> usize {
        self.list.len()
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

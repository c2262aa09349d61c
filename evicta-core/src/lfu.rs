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

#[derive(Debug)]
struct LfuNode<K, V> {
    entry: Entry<K, V>,
    frequency: u64,
}

/// Approximate least-frequently-used cache.
///
/// Entries sit in a list ordered roughly by access count, highest at the head
/// and the eviction end at the tail. A `get` bumps the counter and then only
/// compares the entry with its immediate neighbour towards the head, swapping
/// the two when the neighbour is now strictly less frequent. That keeps every
/// operation O(1) at the price of an ordering that is only locally sorted.
///
/// Entries that were never read after insertion (frequency 1) always form a
/// contiguous run at the tail, newest first. The tail is therefore the oldest
/// entry among the least used ones.
///
/// # Examples
///
/// ```
/// use evicta_core::{EvictionCache, LfuCache};
///
/// let mut cache = LfuCache::new(3).unwrap();
/// cache.put(11, 5);
/// cache.put(22, 6);
/// cache.put(33, 7);
/// cache.get(&11);
/// cache.get(&33);
///
/// let evicted = cache.put(44, 8).unwrap();
/// assert_eq!(evicted.key, 22);
/// assert_eq!(cache.frequency(&11), Some(2));
/// ```
#[derive(Debug)]
pub struct LfuCache<K, V> {
    map: HashMap<K, SlotId>,
    list: OrderedList<LfuNode<K, V>>,
    /// First node of the trailing run of frequency-1 entries.
    run_head: Option<SlotId>,
    capacity: usize,
    notifier: Notifier<K, V>,
}

impl<K, V> LfuCache<K, V>
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
        debug!(capacity, "created lfu cache");
        Ok(Self {
            map: HashMap::with_capacity(capacity),
            list: OrderedList::with_capacity(capacity),
            run_head: None,
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

    /// Returns the access count of `key`, if resident.
    ///
    /// Insertion counts as the first access, so fresh entries report 1.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.map.get(key)?;
        self.list.get(id).map(|node| node.frequency)
    }

    /// Returns the entry that would be evicted next.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        self.list
            .back()
            .map(|node| (&node.entry.key, &node.entry.value))
    }

    /// Iterates entries from the eviction end towards the most used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list
            .iter_rev()
            .map(|node| (&node.entry.key, &node.entry.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Removes the tail entry without notifying anyone.
    pub(crate) fn pop_lfu(&mut self) -> Option<Entry<K, V>> {
        let id = self.list.back_id()?;
        self.detach(id)
    }

    fn frequency_of(&self, id: SlotId) -> u64 {
        self.list.get(id).map_or(0, |node| node.frequency)
    }

    fn detach(&mut self, id: SlotId) -> Option<Entry<K, V>> {
        if self.run_head == Some(id) {
            self.run_head = self.list.next_id(id);
        }
        let node = self.list.remove(id)?;
        self.map.remove(&node.entry.key);
        Some(node.entry)
    }

    /// Counts an access to `id` and restores the local ordering.
    fn touch(&mut self, id: SlotId) {
        let previous = match self.list.get_mut(id) {
            Some(node) => {
                let previous = node.frequency;
                node.frequency = node.frequency.saturating_add(1);
                previous
            }
            None => return,
        };

        if previous == 1 {
            match self.run_head {
                Some(head) if head == id => self.run_head = self.list.next_id(id),
                Some(head) => {
                    self.list.move_before(id, head);
                }
                None => {}
            }
        }

        if let Some(prev) = self.list.prev_id(id) {
            if self.frequency_of(prev) < self.frequency_of(id) {
                self.list.move_before(id, prev);
            }
        }
    }

    #[cfg(test)]
    fn debug_validate(&self) {
        self.list.debug_validate();
        assert_eq!(self.map.len(), self.list.len());

        // everything from run_head to the tail has frequency 1, nothing before it does
        let mut in_run = false;
        let mut current = self.list.front_id();
        while let Some(id) = current {
            if Some(id) == self.run_head {
                in_run = true;
            }
            assert_eq!(self.frequency_of(id) == 1, in_run);
            current = self.list.next_id(id);
        }
    }
}

impl<K, V> EvictionCache<K, V> for LfuCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn put(&mut self, key: K, value: V) -> Option<Entry<K, V>> {
        if let Some(&id) = self.map.get(&key) {
            if let Some(node) = self.list.get_mut(id) {
                node.entry.value = value;
            }
            return None;
        }

        let evicted = if self.list.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let node = LfuNode {
            entry: Entry::new(key.clone(), value),
            frequency: 1,
        };
        let id = match self.run_head {
            Some(head) => self.list.insert_before(head, node),
            None => self.list.push_back(node),
        };
        self.run_head = Some(id);
        self.map.insert(key, id);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.map.get(key) else {
            self.notifier.access(false);
            return None;
        };
        self.notifier.access(true);
        self.touch(id);
        self.list.get(id).map(|node| &node.entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.map.get(key)?;
        self.list.get(id).map(|node| &node.entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = *self.map.get(key)?;
        self.detach(id).map(|entry| entry.value)
    }

    fn evict(&mut self) -> Option<Entry<K, V>> {
        let entry = self.pop_lfu()?;
        trace!(policy = "lfu", "evicted least frequently used entry");
        Some(self.notifier.evicted(entry))
    }

    fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
        self.run_head = None;
        debug!(policy = "lfu", "cleared cache");
    }

    fn resize(&mut self, capacity: usize) -> Result<(), ConfigError> {
        check_capacity(capacity)?;
        while self.list.len() > capacity {
            self.evict();
        }
        debug!(policy = "lfu", from = self.capacity, to = capacity, "resized cache");
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

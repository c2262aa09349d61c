/// A key/value pair handed back to callers when an entry leaves a cache.
///
/// Returned by `evict`, by `put` when inserting displaced another entry, and
/// by the peek-style accessors that expose whole entries.
///
/// # Examples
///
/// ```
/// use evicta_core::{Entry, EvictionCache, LruCache};
///
/// let mut cache = LruCache::new(1).unwrap();
/// cache.put("a", 1);
/// let displaced = cache.put("b", 2);
///
/// assert_eq!(displaced, Some(Entry::new("a", 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Splits the entry into its key and value.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

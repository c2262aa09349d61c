//! Tests for the LFU eviction policy

use evicta::{EvictionCache, LfuCache};

/// Lowest-frequency entry is evicted when a new key arrives
#[test]
fn test_lfu_eviction() {
    let mut cache = LfuCache::new(3).unwrap();
    cache.put(11, 5);
    cache.put(22, 6);
    cache.put(33, 7);
    cache.get(&11);
    cache.get(&33);

    cache.put(44, 8);

    assert_eq!(cache.get(&22), None);
    assert_eq!(cache.get(&11), Some(&5));
    assert_eq!(cache.get(&44), Some(&8));
}

/// Frequencies accumulate across reads
#[test]
fn test_lfu_frequency_tracking() {
    let mut cache = LfuCache::new(2).unwrap();
    cache.put(1, 1);
    cache.put(2, 4);

    for _ in 0..5 {
        assert_eq!(cache.get(&1), Some(&1));
    }
    assert_eq!(cache.frequency(&1), Some(6));
    assert_eq!(cache.frequency(&2), Some(1));

    // 2 is evicted, not the frequently read 1
    assert_eq!(cache.put(3, 9).map(|e| e.key), Some(2));
    assert!(cache.contains(&1));
}

/// Among never-read entries the oldest goes first
#[test]
fn test_lfu_ties_evict_oldest() {
    let mut cache = LfuCache::new(3).unwrap();
    cache.put("x", 1);
    cache.put("y", 2);
    cache.put("z", 3);

    assert_eq!(cache.put("w", 4).map(|e| e.key), Some("x"));
    assert_eq!(cache.put("v", 5).map(|e| e.key), Some("y"));
}

/// A frequently read entry climbs past less read ones one step per access
#[test]
fn test_lfu_hot_key_climbs() {
    let mut cache = LfuCache::new(4).unwrap();
    for k in 1..=4 {
        cache.put(k, k);
    }
    cache.get(&1);
    cache.get(&2);
    for _ in 0..3 {
        cache.get(&4);
    }

    assert_eq!(cache.peek_lfu(), Some((&3, &3)));
    let order: Vec<i32> = cache.iter().map(|(k, _)| *k).collect();
    assert_eq!(order.first(), Some(&3));
    assert_eq!(order.last(), Some(&4));
}

/// Peek does not count as an access
#[test]
fn test_lfu_peek_does_not_count() {
    let mut cache = LfuCache::new(2).unwrap();
    cache.put(1, 1);
    for _ in 0..3 {
        cache.peek(&1);
    }
    assert_eq!(cache.frequency(&1), Some(1));
}

/// Explicit eviction drains from the cold end
#[test]
fn test_lfu_explicit_evict() {
    let mut cache = LfuCache::new(3).unwrap();
    cache.put(1, 1);
    cache.put(2, 2);
    cache.get(&2);

    assert_eq!(cache.evict().map(|e| e.key), Some(1));
    assert_eq!(cache.evict().map(|e| e.key), Some(2));
    assert_eq!(cache.evict(), None);
}

/// Listing walks from the eviction end towards the most used entry
#[test]
fn test_lfu_listing_order() {
    let mut cache = LfuCache::new(4).unwrap();
    for k in 1..=4 {
        cache.put(k, k * 10);
    }
    cache.get(&2);
    cache.get(&2);

    assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4, 2]);
    assert_eq!(cache.values().copied().collect::<Vec<_>>(), vec![10, 30, 40, 20]);
}

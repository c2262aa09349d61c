//! Tests for the segmented LRU policy

use evicta::{ConfigError, EvictionCache, SegmentedCache};
use std::cell::RefCell;
use std::rc::Rc;

fn recording(capacity: usize) -> (SegmentedCache<u32, u32>, Rc<RefCell<Vec<u32>>>) {
    let evicted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&evicted);
    let cache = SegmentedCache::new(capacity)
        .unwrap()
        .with_on_evict(move |k: &u32, _: &u32| sink.borrow_mut().push(*k));
    (cache, evicted)
}

/// A key seen twice outlives keys seen once
#[test]
fn test_slru_promotion_protects_key() {
    let (mut cache, evicted) = recording(5);
    for key in 1..=5 {
        cache.put(key, key);
    }
    cache.get(&1);
    cache.put(6, 6);

    assert!(cache.contains(&1));
    assert!(!cache.contains(&2));
    assert_eq!(*evicted.borrow(), vec![2]);
}

/// A one-off scan cannot flush promoted keys
#[test]
fn test_slru_scan_resistance() {
    let mut cache = SegmentedCache::new(10).unwrap();
    for key in 0..4 {
        cache.put(key, key);
        cache.get(&key);
    }
    for key in 100..200 {
        cache.put(key, key);
    }

    for key in 0..4 {
        assert!(cache.contains(&key), "hot key {} was flushed", key);
    }
    assert_eq!(cache.len(), 10);
}

/// Moving the protected tail back to probation is not an eviction
#[test]
fn test_slru_demotion_is_silent() {
    let (mut cache, evicted) = recording(3);
    cache.put(1, 1);
    cache.put(2, 2);
    cache.put(3, 3);
    cache.get(&1);
    cache.get(&2);
    cache.get(&3);

    assert!(evicted.borrow().is_empty());
    assert_eq!(cache.protected_len(), 2);
    assert_eq!(cache.probation_len(), 1);
}

/// Demoted entries are the first to go when pressure arrives
#[test]
fn test_slru_demoted_entry_evicted_first() {
    let (mut cache, evicted) = recording(3);
    cache.put(1, 1);
    cache.put(2, 2);
    cache.put(3, 3);
    cache.get(&1);
    cache.get(&2);
    cache.get(&3);

    cache.put(4, 4);
    assert_eq!(*evicted.borrow(), vec![1]);
}

/// The victim is only reported once the cache is full
#[test]
fn test_slru_victim_requires_full_cache() {
    let mut cache = SegmentedCache::new(4).unwrap();
    cache.put(1, 1);
    cache.put(2, 2);
    cache.put(3, 3);
    assert_eq!(cache.victim(), None);

    cache.put(4, 4);
    assert_eq!(cache.victim(), Some((&1, &1)));
    assert_eq!(cache.evict().map(|e| e.key), Some(1));
}

/// Custom protected ratios change the split
#[test]
fn test_slru_custom_ratio() {
    let cache: SegmentedCache<u32, u32> = SegmentedCache::with_protected_ratio(10, 0.5).unwrap();
    assert_eq!(cache.protected_capacity(), 5);

    assert!(matches!(
        SegmentedCache::<u32, u32>::with_protected_ratio(10, 0.0),
        Err(ConfigError::InvalidRatio { .. })
    ));
}

/// Remove works in both segments without firing the callback
#[test]
fn test_slru_remove_from_either_segment() {
    let (mut cache, evicted) = recording(4);
    cache.put(1, 10);
    cache.put(2, 20);
    cache.get(&2);

    assert_eq!(cache.remove(&1), Some(10));
    assert_eq!(cache.remove(&2), Some(20));
    assert!(cache.is_empty());
    assert!(evicted.borrow().is_empty());
}

/// Listing covers probation first, then protected, each oldest first
#[test]
fn test_slru_listing_order() {
    let mut cache = SegmentedCache::new(5).unwrap();
    for key in 1..=5 {
        cache.put(key, key * 10);
    }
    cache.get(&1);
    cache.get(&3);

    assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![2, 4, 5, 1, 3]);
    assert_eq!(
        cache.values().copied().collect::<Vec<_>>(),
        vec![20, 40, 50, 10, 30]
    );
    assert_eq!(cache.iter().count(), cache.len());
}

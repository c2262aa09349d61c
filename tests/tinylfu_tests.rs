//! Tests for the W-TinyLFU admission policy

use evicta::{BytesKeyHasher, ConfigError, EvictionCache, TinyLfuCache};
use std::cell::RefCell;
use std::rc::Rc;

/// Small cache walkthrough: the unread newcomer loses the tie and is dropped
#[test]
fn test_tinylfu_end_to_end_scenario() {
    let mut cache = TinyLfuCache::with_seed(3, 99).unwrap();
    cache.put(11, 5);
    cache.put(22, 6);
    cache.put(33, 7);
    cache.get(&11);
    cache.put(44, 8);

    assert_eq!(cache.get(&33), None);
    assert_eq!(cache.get(&11), Some(&5));
    assert_eq!(cache.get(&44), Some(&8));
    assert_eq!(cache.get(&22), Some(&6));
}

/// A key read several times while in the window wins admission over a cold victim
#[test]
fn test_tinylfu_hot_candidate_admitted() {
    let mut cache = TinyLfuCache::with_seed(100, 7).unwrap();
    for key in 0..100 {
        cache.put(key, key);
    }
    cache.put(1000, 1000);
    for _ in 0..5 {
        assert_eq!(cache.get(&1000), Some(&1000));
    }

    // 1000 spills out of the window now
    let discarded = cache.put(2000, 2000).unwrap();
    assert_ne!(discarded.key, 1000);
    assert!(cache.contains(&1000));
    assert_eq!(cache.main_len(), 99);
    assert_eq!(cache.len(), 100);
}

/// Cold candidates never displace entries that have been read before
#[test]
fn test_tinylfu_cold_candidates_rejected() {
    let mut cache = TinyLfuCache::with_seed(100, 7).unwrap();
    for key in 0..100 {
        cache.put(key, key);
    }
    for key in 0..99 {
        assert!(cache.get(&key).is_some());
    }

    let mut previous = 99;
    for key in 1000..1020 {
        let discarded = cache.put(key, key).unwrap();
        assert_eq!(discarded.key, previous);
        previous = key;
    }
    for key in 0..99 {
        assert!(cache.contains(&key), "main entry {} was displaced", key);
    }
}

/// Whichever side loses the admission contest reaches the callback
#[test]
fn test_tinylfu_callback_sees_discarded_entries() {
    let evicted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&evicted);
    let mut cache = TinyLfuCache::with_seed(3, 1)
        .unwrap()
        .with_on_evict(move |k: &u32, _: &u32| sink.borrow_mut().push(*k));

    let mut returned = Vec::new();
    for key in 0..20 {
        if let Some(entry) = cache.put(key, key) {
            returned.push(entry.key);
        }
        assert!(cache.len() <= 3);
    }

    assert_eq!(returned.len(), 17);
    assert_eq!(*evicted.borrow(), returned);
}

/// Re-putting a resident key updates it wherever it lives
#[test]
fn test_tinylfu_update_in_place() {
    let mut cache = TinyLfuCache::with_seed(10, 3).unwrap();
    for key in 0..10 {
        cache.put(key, 0);
    }
    assert_eq!(cache.put(9, 90), None);
    assert_eq!(cache.put(0, 100), None);

    assert_eq!(cache.peek(&9), Some(&90));
    assert_eq!(cache.peek(&0), Some(&100));
    assert_eq!(cache.len(), 10);
}

/// Capacities below three cannot hold a window and a segmented main cache
#[test]
fn test_tinylfu_minimum_capacity() {
    assert_eq!(
        TinyLfuCache::<u8, u8>::new(2).unwrap_err(),
        ConfigError::CapacityTooSmall {
            policy: "tinylfu",
            capacity: 2,
            minimum: 3
        }
    );
    assert!(TinyLfuCache::<u8, u8>::new(3).is_ok());
}

/// Keys can be hashed from a caller-defined byte encoding
#[test]
fn test_tinylfu_custom_key_hasher() {
    let hasher = BytesKeyHasher::new(|key: &String| key.to_lowercase().into_bytes());
    let mut cache = TinyLfuCache::with_hasher_and_seed(10, hasher, 5).unwrap();

    cache.put("Alpha".to_string(), 1);
    cache.get(&"Alpha".to_string());

    // same encoding, so the same frequency estimate
    assert_eq!(
        cache.frequency(&"ALPHA".to_string()),
        cache.frequency(&"alpha".to_string())
    );
    assert!(cache.frequency(&"alpha".to_string()) >= 2);
}

/// Explicit eviction empties the main cache before touching the window
#[test]
fn test_tinylfu_evict_order() {
    let mut cache = TinyLfuCache::with_seed(5, 3).unwrap();
    for key in 0..5 {
        cache.put(key, key);
    }
    assert_eq!(cache.window_len(), 1);

    let order: Vec<i32> = std::iter::from_fn(|| cache.evict().map(|e| e.key)).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

/// Listing shows the window entry first, then the main cache
#[test]
fn test_tinylfu_listing_order() {
    let mut cache = TinyLfuCache::with_seed(5, 3).unwrap();
    for key in 0..5 {
        cache.put(key, key * 10);
    }

    assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![4, 0, 1, 2, 3]);
    assert_eq!(
        cache.values().copied().collect::<Vec<_>>(),
        vec![40, 0, 10, 20, 30]
    );
}

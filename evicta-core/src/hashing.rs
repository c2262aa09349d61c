use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::xxh3_64;

/// Maps a key to the 64-bit hash fed to the frequency sketch and the
/// doorkeeper filter of a [`TinyLfuCache`](crate::TinyLfuCache).
///
/// Implementations must be deterministic for the lifetime of the cache: the
/// same key has to produce the same hash on every call, otherwise frequency
/// estimates are meaningless.
///
/// Any `Fn(&K) -> u64` closure is a `KeyHasher`:
///
/// ```
/// use evicta_core::KeyHasher;
///
/// let identity = |key: &u64| *key;
/// assert_eq!(identity.hash_key(&99), 99);
/// ```
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

/// Hashes keys through their [`Hash`] impl with std's SipHasher.
///
/// `DefaultHasher::new()` always starts from the same keys, so the result is
/// stable within a process.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyHasher;

impl<K: Hash + ?Sized> KeyHasher<K> for DefaultKeyHasher {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

impl<K: ?Sized, F> KeyHasher<K> for F
where
    F: Fn(&K) -> u64,
{
    fn hash_key(&self, key: &K) -> u64 {
        self(key)
    }
}

/// Hashes the byte representation produced by a user function with xxh3.
///
/// Useful when keys already have a canonical encoding (a wire format, a
/// storage key) that should drive frequency counting instead of `Hash`.
///
/// # Examples
///
/// ```
/// use evicta_core::{BytesKeyHasher, KeyHasher};
///
/// let hasher = BytesKeyHasher::new(|key: &String| key.as_bytes().to_vec());
/// assert_eq!(
///     hasher.hash_key(&"user:1".to_string()),
///     hasher.hash_key(&"user:1".to_string())
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BytesKeyHasher<F> {
    to_bytes: F,
}

impl<F> BytesKeyHasher<F> {
    pub fn new(to_bytes: F) -> Self {
        Self { to_bytes }
    }
}

impl<K: ?Sized, F> KeyHasher<K> for BytesKeyHasher<F>
where
    F: Fn(&K) -> Vec<u8>,
{
    fn hash_key(&self, key: &K) -> u64 {
        xxh3_64(&(self.to_bytes)(key))
    }
}

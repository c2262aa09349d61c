use std::f64::consts::LN_2;

use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{check_capacity, check_probability};
use crate::utils::mix64;
use crate::ConfigError;

/// Bloom filter over pre-computed 64-bit hashes.
///
/// Used as a doorkeeper in front of a [`FrequencySketch`](crate::FrequencySketch):
/// it answers "was this key seen before" with false positives but never false
/// negatives.
///
/// The bit array is sized with the usual formulas and rounded up to whole
/// 64-bit words:
///
/// ```text
///   bits   = ceil(capacity * -ln(p) / ln(2)^2)
///   hashes = ceil(ln(2) * bits / capacity)
/// ```
///
/// # Examples
///
/// ```
/// use evicta_core::MembershipFilter;
///
/// let mut filter = MembershipFilter::with_seed(100, 0.01, 1).unwrap();
/// assert!(!filter.contains(7));
///
/// filter.add(7);
/// assert!(filter.contains(7));
/// assert_eq!(filter.bit_len() % 64, 0);
/// ```
#[derive(Debug, Clone)]
pub struct MembershipFilter {
    words: Vec<u64>,
    seeds: Vec<u64>,
    bits: u64,
}

impl MembershipFilter {
    /// Creates a filter for `capacity` keys at the given false-positive rate,
    /// with randomly drawn hash seeds.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] or [`ConfigError::InvalidProbability`].
    pub fn new(capacity: usize, false_positive_rate: f64) -> Result<Self, ConfigError> {
        Self::with_seed(capacity, false_positive_rate, fastrand::u64(..))
    }

    /// Same as [`new`](Self::new) with hash seeds derived from `seed`.
    pub fn with_seed(
        capacity: usize,
        false_positive_rate: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        check_capacity(capacity)?;
        check_probability("false_positive_rate", false_positive_rate)?;

        let raw_bits = (capacity as f64 * -false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
        let words = ((raw_bits / 64.0).ceil() as usize).max(1);
        let bits = words as u64 * 64;
        let hashes = ((LN_2 * bits as f64 / capacity as f64).ceil() as usize).max(1);

        let mut rng = fastrand::Rng::with_seed(seed);
        let seeds = (0..hashes).map(|_| rng.u64(..)).collect();

        debug!(capacity, bits, hashes, "created membership filter");
        Ok(Self {
            words: vec![0; words],
            seeds,
            bits,
        })
    }

    /// Length of the bit array; always a multiple of 64.
    pub fn bit_len(&self) -> usize {
        self.bits as usize
    }

    /// Number of hash seeds, i.e. bits set per key.
    pub fn hashes(&self) -> usize {
        self.seeds.len()
    }

    #[inline]
    fn positions(&self, hash: u64) -> impl Iterator<Item = u64> + '_ {
        self.seeds
            .iter()
            .map(move |seed| mix64(hash ^ seed) % self.bits)
    }

    pub fn add(&mut self, hash: u64) {
        let bits = self.bits;
        for seed in &self.seeds {
            let pos = mix64(hash ^ seed) % bits;
            self.words[(pos / 64) as usize] |= 1 << (pos % 64);
        }
    }

    /// Returns `true` if every bit for `hash` is set.
    pub fn contains(&self, hash: u64) -> bool {
        self.positions(hash)
            .all(|pos| self.words[(pos / 64) as usize] & (1 << (pos % 64)) != 0)
    }

    /// [`add`](Self::add) for a byte string, hashed with xxh3.
    pub fn add_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        self.add(xxh3_64(bytes.as_ref()));
    }

    pub fn contains_bytes(&self, bytes: impl AsRef<[u8]>) -> bool {
        self.contains(xxh3_64(bytes.as_ref()))
    }

    /// Clears every bit. The seeds are kept.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let filter = MembershipFilter::with_seed(100, 0.01, 0).unwrap();
        // 100 * 4.605 / 0.4805 = 958.5 -> 959 -> 960
        assert_eq!(filter.bit_len(), 960);
        // 0.693 * 960 / 100 = 6.65
        assert_eq!(filter.hashes(), 7);

        let small = MembershipFilter::with_seed(3, 0.01, 0).unwrap();
        assert_eq!(small.bit_len(), 64);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            MembershipFilter::new(0, 0.01).unwrap_err(),
            ConfigError::ZeroCapacity
        );
        assert!(MembershipFilter::new(10, 0.0).is_err());
        assert!(MembershipFilter::new(10, 1.5).is_err());
    }

    #[test]
    fn test_no_false_negatives() {
        let mut filter = MembershipFilter::with_seed(500, 0.01, 42).unwrap();
        for h in 0..500u64 {
            filter.add(mix64(h));
        }
        assert!((0..500u64).all(|h| filter.contains(mix64(h))));
    }

    #[test]
    fn test_false_positive_rate_is_reasonable() {
        let mut filter = MembershipFilter::with_seed(1000, 0.01, 42).unwrap();
        for h in 0..1000u64 {
            filter.add(h);
        }
        let false_positives = (10_000..20_000u64).filter(|h| filter.contains(*h)).count();
        assert!(false_positives < 500, "{} false positives", false_positives);
    }

    #[test]
    fn test_bytes_entry_points() {
        let mut filter = MembershipFilter::with_seed(100, 0.01, 8).unwrap();
        filter.add_bytes("session:42");

        assert!(filter.contains_bytes("session:42"));
        assert!(filter.contains_bytes(b"session:42".to_vec()));
        assert!(filter.contains(xxh3_64(b"session:42")));
    }

    #[test]
    fn test_clear() {
        let mut filter = MembershipFilter::with_seed(10, 0.01, 1).unwrap();
        filter.add(3);
        filter.clear();
        assert!(!filter.contains(3));
    }
}

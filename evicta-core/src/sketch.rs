//! Count-Min sketch with 4-bit saturating counters.
//!
//! Each row is an array of `u64` words holding [`COUNTERS_PER_WORD`] nibble
//! counters. A key's hash is mixed with a per-row seed to pick one counter in
//! every row:
//!
//! ```text
//!   h = mix64(hash ^ seed[row])
//!   word   = (h >> 4) & (words_per_row - 1)
//!   nibble = h & 15
//! ```
//!
//! The estimate is the minimum over all rows. Collisions can only push a
//! counter up, so the sketch may overcount but never undercounts (until
//! [`FrequencySketch::attenuation`] ages it).

use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::check_probability;
use crate::utils::mix64;
use crate::ConfigError;

/// Width of a single counter in bits.
pub const COUNTER_BITS: u32 = 4;

/// Largest value a counter can hold.
pub const COUNTER_MAX: u8 = (1 << COUNTER_BITS) - 1;

/// Number of counters packed into one `u64` word.
pub const COUNTERS_PER_WORD: usize = (u64::BITS / COUNTER_BITS) as usize;

const COUNTER_MASK: u64 = COUNTER_MAX as u64;

/// Every nibble with its high bit cleared; halving a whole word at once.
const HALVING_MASK: u64 = 0x7777_7777_7777_7777;

/// Approximate frequency counter.
///
/// # Examples
///
/// ```
/// use evicta_core::FrequencySketch;
///
/// let mut sketch = FrequencySketch::with_seed(1000, 1, 0.01, 7).unwrap();
/// sketch.add(42, 3);
/// sketch.add(42, 1);
///
/// assert!(sketch.estimate(42) >= 4);
/// assert_eq!(sketch.estimate(43), 0);
///
/// sketch.attenuation(2);
/// assert_eq!(sketch.estimate(42), 2);
/// ```
#[derive(Debug, Clone)]
pub struct FrequencySketch {
    table: Vec<u64>,
    seeds: Vec<u64>,
    words: usize,
}

impl FrequencySketch {
    /// Builds a sketch for roughly `size` distinct keys that overcounts by
    /// more than `error_range` with probability at most `error_rate`.
    ///
    /// Hash seeds come from the process-wide random source; use
    /// [`with_seed`](Self::with_seed) for reproducible layouts.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::ZeroCapacity`] if `size` is zero.
    /// * [`ConfigError::ErrorRangeOutOfBounds`] if `error_range` is zero or
    ///   does not fit a counter.
    /// * [`ConfigError::InvalidProbability`] if `error_rate` is not in `(0, 1)`.
    pub fn new(size: usize, error_range: u8, error_rate: f64) -> Result<Self, ConfigError> {
        Self::with_seed(size, error_range, error_rate, fastrand::u64(..))
    }

    /// Same as [`new`](Self::new) with hash seeds derived from `seed`.
    pub fn with_seed(
        size: usize,
        error_range: u8,
        error_rate: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if error_range == 0 || error_range > COUNTER_MAX {
            return Err(ConfigError::ErrorRangeOutOfBounds {
                error_range,
                max: COUNTER_MAX,
            });
        }
        check_probability("error_rate", error_rate)?;

        let counters = std::f64::consts::E * size as f64 / f64::from(error_range);
        let words = ((counters / COUNTERS_PER_WORD as f64).ceil() as usize)
            .max(1)
            .next_power_of_two();
        let rows = ((1.0 / error_rate).ln().ceil() as usize).max(1);

        let mut rng = fastrand::Rng::with_seed(seed);
        let seeds = (0..rows).map(|_| rng.u64(..)).collect();

        debug!(size, words, rows, "created frequency sketch");
        Ok(Self {
            table: vec![0; words * rows],
            seeds,
            words,
        })
    }

    /// Builds a sketch for `size` counted events spread over `elements`
    /// distinct keys.
    ///
    /// The tolerated overcount is `size / elements`, capped at
    /// [`COUNTER_MAX`].
    ///
    /// # Errors
    ///
    /// * [`ConfigError::ZeroCapacity`] if `size` or `elements` is zero.
    /// * [`ConfigError::ElementsExceedSize`] if `elements > size`.
    /// * [`ConfigError::InvalidProbability`] if `error_rate` is not in `(0, 1)`.
    pub fn with_elements(
        size: usize,
        elements: usize,
        error_rate: f64,
    ) -> Result<Self, ConfigError> {
        if size == 0 || elements == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if elements > size {
            return Err(ConfigError::ElementsExceedSize { elements, size });
        }
        let error_range = (size / elements).min(usize::from(COUNTER_MAX)) as u8;
        Self::new(size, error_range, error_rate)
    }

    /// Counters per row.
    pub fn counters(&self) -> usize {
        self.words * COUNTERS_PER_WORD
    }

    /// Number of rows, one hash seed each.
    pub fn hashes(&self) -> usize {
        self.seeds.len()
    }

    #[inline]
    fn locate(&self, row: usize, hash: u64) -> (usize, u32) {
        let h = mix64(hash ^ self.seeds[row]);
        let word = ((h >> COUNTER_BITS) as usize) & (self.words - 1);
        let shift = ((h & COUNTER_MASK) as u32) * COUNTER_BITS;
        (row * self.words + word, shift)
    }

    /// Adds `amount` to every counter `hash` maps to, saturating at
    /// [`COUNTER_MAX`].
    pub fn add(&mut self, hash: u64, amount: u8) {
        for row in 0..self.seeds.len() {
            let (idx, shift) = self.locate(row, hash);
            let word = self.table[idx];
            let current = (word >> shift) & COUNTER_MASK;
            let updated = (current + u64::from(amount)).min(COUNTER_MASK);
            self.table[idx] = (word & !(COUNTER_MASK << shift)) | (updated << shift);
        }
    }

    /// Returns the smallest counter `hash` maps to.
    pub fn estimate(&self, hash: u64) -> u8 {
        let mut min = COUNTER_MAX;
        for row in 0..self.seeds.len() {
            let (idx, shift) = self.locate(row, hash);
            let count = ((self.table[idx] >> shift) & COUNTER_MASK) as u8;
            if count == 0 {
                return 0;
            }
            min = min.min(count);
        }
        min
    }

    /// [`add`](Self::add) for a byte string, hashed with xxh3.
    pub fn add_bytes(&mut self, bytes: impl AsRef<[u8]>, amount: u8) {
        self.add(xxh3_64(bytes.as_ref()), amount);
    }

    pub fn estimate_bytes(&self, bytes: impl AsRef<[u8]>) -> u8 {
        self.estimate(xxh3_64(bytes.as_ref()))
    }

    /// Divides every counter by `factor`.
    ///
    /// A factor of 0, or one larger than any counter can hold, resets the
    /// sketch.
    pub fn attenuation(&mut self, factor: u8) {
        match factor {
            0 => self.clear(),
            f if f > COUNTER_MAX => self.clear(),
            1 => {}
            2 => {
                for word in &mut self.table {
                    *word = (*word >> 1) & HALVING_MASK;
                }
            }
            f => {
                let f = u64::from(f);
                for word in &mut self.table {
                    let mut aged = 0u64;
                    for slot in 0..COUNTERS_PER_WORD as u32 {
                        let shift = slot * COUNTER_BITS;
                        let count = (*word >> shift) & COUNTER_MASK;
                        aged |= (count / f) << shift;
                    }
                    *word = aged;
                }
            }
        }
    }

    /// Zeroes every counter. The seeds are kept.
    pub fn clear(&mut self) {
        self.table.iter_mut().for_each(|word| *word = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_constants() {
        assert_eq!(COUNTER_MAX, 15);
        assert_eq!(COUNTERS_PER_WORD, 16);
        assert_eq!(HALVING_MASK & COUNTER_MASK, 0x7);
    }

    #[test]
    fn test_dimensions() {
        let sketch = FrequencySketch::with_seed(100, 1, 0.01, 1).unwrap();
        // e * 100 / 16 = 16.99 -> 17 words -> 32
        assert_eq!(sketch.counters(), 32 * 16);
        // ln(100) = 4.6
        assert_eq!(sketch.hashes(), 5);

        let tiny = FrequencySketch::with_seed(1, 15, 0.5, 1).unwrap();
        assert_eq!(tiny.counters(), 16);
        assert_eq!(tiny.hashes(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            FrequencySketch::new(0, 1, 0.01).unwrap_err(),
            ConfigError::ZeroCapacity
        );
        assert_eq!(
            FrequencySketch::new(10, 16, 0.01).unwrap_err(),
            ConfigError::ErrorRangeOutOfBounds {
                error_range: 16,
                max: 15
            }
        );
        assert!(FrequencySketch::new(10, 0, 0.01).is_err());
        assert!(FrequencySketch::new(10, 1, 0.0).is_err());
        assert!(FrequencySketch::new(10, 1, 1.0).is_err());
    }

    #[test]
    fn test_counters_saturate() {
        let mut sketch = FrequencySketch::with_seed(10, 1, 0.01, 3).unwrap();
        sketch.add(9, 10);
        sketch.add(9, 10);
        assert_eq!(sketch.estimate(9), COUNTER_MAX);

        sketch.add(9, u8::MAX);
        assert_eq!(sketch.estimate(9), COUNTER_MAX);
    }

    #[test]
    fn test_fresh_sketch_reads_zero() {
        let sketch = FrequencySketch::with_seed(64, 1, 0.01, 11).unwrap();
        assert!((0..1000u64).all(|h| sketch.estimate(h) == 0));
    }

    #[test]
    fn test_unseen_keys_stay_zero() {
        let mut sketch = FrequencySketch::with_seed(1000, 1, 0.01, 5).unwrap();
        for h in 0..10u64 {
            sketch.add(h, 1);
        }
        assert!((1000..1100u64).all(|h| sketch.estimate(h) == 0));
    }

    #[test]
    fn test_attenuation_factors() {
        let mut sketch = FrequencySketch::with_seed(1000, 1, 0.01, 9).unwrap();
        sketch.add(77, 9);
        assert_eq!(sketch.estimate(77), 9);

        sketch.attenuation(1);
        assert_eq!(sketch.estimate(77), 9);

        sketch.attenuation(2);
        assert_eq!(sketch.estimate(77), 4);

        sketch.attenuation(3);
        assert_eq!(sketch.estimate(77), 1);

        sketch.attenuation(0);
        assert_eq!(sketch.estimate(77), 0);
    }

    #[test]
    fn test_attenuation_above_counter_max_resets() {
        let mut sketch = FrequencySketch::with_seed(1000, 1, 0.01, 9).unwrap();
        sketch.add(5, 15);
        sketch.attenuation(16);
        assert_eq!(sketch.estimate(5), 0);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut a = FrequencySketch::with_seed(50, 2, 0.05, 123).unwrap();
        let mut b = FrequencySketch::with_seed(50, 2, 0.05, 123).unwrap();
        for h in [1u64, 2, 3, 1, 1] {
            a.add(h, 1);
            b.add(h, 1);
        }
        assert_eq!(a.table, b.table);
    }

    #[test]
    fn test_with_elements_derives_error_range() {
        // range 10: e * 1000 / 10 / 16 = 16.99 -> 17 words -> 32
        let sketch = FrequencySketch::with_elements(1000, 100, 0.01).unwrap();
        assert_eq!(sketch.counters(), 32 * 16);

        // 1000 / 10 = 100, capped at 15: 11.3 -> 12 words -> 16
        let capped = FrequencySketch::with_elements(1000, 10, 0.01).unwrap();
        assert_eq!(capped.counters(), 16 * 16);

        assert_eq!(
            FrequencySketch::with_elements(10, 11, 0.01).unwrap_err(),
            ConfigError::ElementsExceedSize {
                elements: 11,
                size: 10
            }
        );
        assert_eq!(
            FrequencySketch::with_elements(10, 0, 0.01).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn test_bytes_and_strings_share_hashing() {
        let mut sketch = FrequencySketch::with_seed(100, 1, 0.01, 4).unwrap();
        sketch.add_bytes("user:7", 2);
        sketch.add_bytes(b"user:7", 1);
        sketch.add_bytes(String::from("user:7"), 1);

        assert!(sketch.estimate_bytes("user:7") >= 4);
        assert_eq!(sketch.estimate_bytes("user:7"), sketch.estimate(xxh3_64(b"user:7")));
    }

    #[test]
    fn test_clear() {
        let mut sketch = FrequencySketch::with_seed(10, 1, 0.01, 3).unwrap();
        sketch.add(1, 5);
        sketch.clear();
        assert_eq!(sketch.estimate(1), 0);
    }
}

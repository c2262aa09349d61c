use thiserror::Error;

/// Error returned when a cache or sketch is constructed (or resized) with
/// parameters below its structural minimum.
///
/// Configuration errors are the only failure mode in this crate. Runtime
/// operations such as `put` or `get` never fail: a missing key is reported
/// as `None`.
///
/// # Examples
///
/// ```
/// use evicta_core::{ConfigError, LruCache};
///
/// let err = LruCache::<u32, u32>::new(0).unwrap_err();
/// assert_eq!(err, ConfigError::ZeroCapacity);
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Capacity must be at least one entry.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// Capacity is below the minimum the policy needs for its internal layout.
    #[error("capacity {capacity} is too small, {policy} requires at least {minimum}")]
    CapacityTooSmall {
        policy: &'static str,
        capacity: usize,
        minimum: usize,
    },

    /// A ratio parameter fell outside the open interval `(0, 1)`.
    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    /// The Count-Min error range cannot be represented by a 4-bit counter.
    #[error("error range {error_range} must be between 1 and {max}")]
    ErrorRangeOutOfBounds { error_range: u8, max: u8 },

    /// A probability parameter fell outside the open interval `(0, 1)`.
    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// More distinct elements were declared than the sketch is sized for.
    #[error("{elements} elements exceed sketch size {size}")]
    ElementsExceedSize { elements: usize, size: usize },

    /// Sampling-based eviction was asked to sample more entries than fit.
    #[error("sample count {samples} exceeds capacity {capacity}")]
    SamplesExceedCapacity { samples: usize, capacity: usize },
}

/// Rejects a zero capacity.
pub(crate) fn check_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity);
    }
    Ok(())
}

/// Rejects a probability outside `(0, 1)`; NaN is rejected too.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

/// Scrambles a 64-bit value with the splitmix64 finalizer.
///
/// Sketch and filter positions are derived from `mix64(hash ^ seed)` so that
/// each seed yields an independent-looking index even when callers hand in
/// weak hashes (sequential integers, for instance).
///
/// # Examples
///
/// ```
/// use evicta_core::utils::mix64;
///
/// assert_eq!(mix64(42), mix64(42));
/// assert_ne!(mix64(1), mix64(2));
/// ```
#[inline]
pub fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Splits `total` into `(probation, protected)` segment sizes.
///
/// The protected share is `round(total * ratio)` capped at `total - 1`, so
/// probation always keeps a slot whenever `total >= 2`. Either side may come
/// out as zero for tiny totals; callers decide whether that is acceptable.
///
/// # Examples
///
/// ```
/// use evicta_core::utils::split_segments;
///
/// assert_eq!(split_segments(10, 0.8), (2, 8));
/// assert_eq!(split_segments(2, 0.8), (1, 1));
/// assert_eq!(split_segments(1, 0.8), (1, 0));
/// ```
pub fn split_segments(total: usize, ratio: f64) -> (usize, usize) {
    let protected = ((total as f64) * ratio).round() as usize;
    let protected = protected.min(total.saturating_sub(1));
    (total - protected, protected)
}

/// Size of the admission window for a W-TinyLFU cache of `total` entries.
///
/// Always at least one slot.
pub fn window_capacity(total: usize, ratio: f64) -> usize {
    (((total as f64) * ratio).round() as usize).max(1)
}

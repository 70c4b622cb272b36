//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Narrow a u32 to u16, saturating at `u16::MAX`.
#[must_use]
pub fn saturating_u32_to_u16(value: u32) -> u16 {
    cast::<u32, u16>(value).unwrap_or(u16::MAX)
}

/// Convert u32 to f64 (lossless, kept here so call sites stay cast-free).
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert u64 to f64; values past 2^53 lose precision.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Sanitize a cost or distance: non-finite and negative values become 0.0.
#[must_use]
pub fn non_negative_finite(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Round a f64 to `places` decimals for stable display and serialization.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

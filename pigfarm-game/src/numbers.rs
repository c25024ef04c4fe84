//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u64 range. NaN and negatives give 0, `+inf` saturates.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.min(max).floor();
    cast::<f64, u64>(clamped).unwrap_or(u64::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Exponent helper for level-indexed growth curves.
#[must_use]
pub fn powi_level(base: f64, level: u32) -> f64 {
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    base.powi(exponent)
}

/// Compact display form: `1.5K`, `2.0M`, or the plain integer below a thousand.
#[must_use]
pub fn format_compact(value: u64) -> String {
    let as_float = u64_to_f64(value);
    if value >= 1_000_000 {
        format!("{:.1}M", as_float / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", as_float / 1_000.0)
    } else {
        value.to_string()
    }
}

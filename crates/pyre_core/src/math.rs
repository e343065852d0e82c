//! Fixed-point and integer helpers for deterministic combat math.
//!
//! Everything that feeds the battle hash stays in integers. Fractional
//! comparisons (HP ratios) go through fixed-point so no float ever
//! decides an outcome.

use fixed::types::I32F32;

/// Fixed-point number type for fractional simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Ratio of `current` to `max` as a fixed-point value.
///
/// A non-positive `max` yields zero rather than dividing by zero.
#[must_use]
pub fn hp_ratio(current: i32, max: i32) -> Fixed {
    if max <= 0 {
        return Fixed::ZERO;
    }
    Fixed::from_num(current) / Fixed::from_num(max)
}

/// Scale `value` by `(100 + percent) / 100` using integer math.
///
/// Negative percentages shrink the value, positive ones grow it. The
/// multiplier never drops below zero.
#[must_use]
pub fn scale_by_percent(value: i64, percent: i32) -> i64 {
    let factor = i64::from((100 + percent).max(0));
    value * factor / 100
}

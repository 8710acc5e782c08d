//! Affine scaling between raw integers and physical values.
//!
//! `value = raw * factor + bias`
//!
//! The forward transform is exact; rounding to two decimals is a presentation
//! step and is applied once, by the extractor, through [`round_for_output`].
//! The inverse rounds half away from zero ([`f64::round`]) and clamps to the
//! width's representable range. A forward/inverse pair is therefore not a
//! perfect round trip: the raw value can drift by the rounding step.

use crate::codec::DataWidth;

/// Number of decimal places kept in presented physical values.
pub const OUTPUT_DECIMALS: i32 = 2;

/// Raw integer to physical value, without rounding.
#[inline]
pub fn to_physical(raw: u16, factor: f64, bias: f64) -> f64 {
    f64::from(raw) * factor + bias
}

/// Round a physical value to [`OUTPUT_DECIMALS`] places for presentation.
#[inline]
pub fn round_for_output(value: f64) -> f64 {
    let scale = 10f64.powi(OUTPUT_DECIMALS);
    (value * scale).round() / scale
}

/// Rounded raw candidate for `value`, before clamping.
///
/// May be negative, larger than any width, or non-finite.
#[inline]
pub fn unclamped_raw(value: f64, factor: f64, bias: f64) -> f64 {
    ((value - bias) / factor).round()
}

/// Physical value to raw integer, clamped to `[0, width.max_raw()]`.
///
/// `factor` must be non-zero; the registry rejects zero factors at load time.
/// A NaN candidate maps to 0, positive infinity to the width maximum.
pub fn to_raw(value: f64, factor: f64, bias: f64, width: DataWidth) -> u32 {
    clamp_raw(unclamped_raw(value, factor, bias), width)
}

/// Clamp a rounded candidate into the width's raw range.
pub fn clamp_raw(candidate: f64, width: DataWidth) -> u32 {
    let max = width.max_raw();
    if candidate.is_nan() || candidate <= 0.0 {
        return 0;
    }
    if candidate >= f64::from(max) {
        return max;
    }
    // In range and integral after rounding, so the cast is exact.
    candidate as u32
}

/// Whether `value` had to be clamped to fit `width`.
pub fn needs_clamp(value: f64, factor: f64, bias: f64, width: DataWidth) -> bool {
    let candidate = unclamped_raw(value, factor, bias);
    !(0.0..=f64::from(width.max_raw())).contains(&candidate)
}

/// Synthesized axis label: `round(index * scale)`, then presentation rounding.
pub fn synthesize_axis_value(index: usize, scale: f64) -> f64 {
    let index = u32::try_from(index).map_or(f64::from(u32::MAX), f64::from);
    round_for_output((index * scale).round())
}

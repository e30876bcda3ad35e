//! Checked numeric conversions for raster processing.
//!
//! ## Pixel coordinates (`f64` → `usize`)
//! Fractional pixel positions come from world coordinates and may be negative,
//! NaN, or past the last column; they are bounds-checked before indexing.
//!
//! ## TIFF dimensions (`usize` → `u32`)
//! TIFF image dimensions are 32-bit; larger grids are rejected rather than
//! silently truncated.

use std::convert::TryFrom;

/// Convert a `usize` to `u32`, failing on overflow.
///
/// # Errors
/// Returns an error string if the value exceeds `u32::MAX`.
#[inline]
pub fn usize_to_u32(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("Value {value} exceeds u32 maximum"))
}

/// Convert a float to a pixel index, returning `None` if out of bounds.
///
/// Negative values, NaN, and values at or past `max_value` give `None`.
#[inline]
#[must_use]
pub fn f64_to_pixel_index(value: f64, max_value: usize) -> Option<usize> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    // Safety: value >= 0 and not NaN
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = value as usize;
    if index >= max_value {
        None
    } else {
        Some(index)
    }
}

/// Convert a float to a pixel index clamped to `0..max_value`.
#[inline]
#[must_use]
pub fn f64_to_clamped_pixel(value: f64, max_value: usize) -> usize {
    if value.is_nan() || value < 0.0 {
        return 0;
    }
    // Safety: value >= 0 and not NaN
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = value as usize;
    if index >= max_value {
        max_value.saturating_sub(1)
    } else {
        index
    }
}

/// Step a pixel index by a signed offset, returning `None` below zero.
#[inline]
#[must_use]
pub fn step_index(index: usize, step: isize) -> Option<usize> {
    index.checked_add_signed(step)
}

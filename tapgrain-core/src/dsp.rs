//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Time-to-sample conversions that can never overflow the `min + 1` widening
//!   done by the parameter resolver
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Argument and return domains are documented per function.

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] fn m_round(x: f32) -> f32 { x.round() }
        #[inline] fn m_floor(x: f32) -> f32 { x.floor() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_ln(x: f32) -> f32 { x.ln() }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] fn m_round(x: f32) -> f32 { libm::roundf(x) }
        #[inline] fn m_floor(x: f32) -> f32 { libm::floorf(x) }
        #[inline] fn m_exp(x: f32) -> f32 { libm::expf(x) }
        #[inline] fn m_ln(x: f32) -> f32 { libm::logf(x) }
    // std backend
    } else {
        #[inline] fn m_round(x: f32) -> f32 { x.round() }
        #[inline] fn m_floor(x: f32) -> f32 { x.floor() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_ln(x: f32) -> f32 { x.ln() }
    }
}

// --------------------------------- Constants -------------------------------------

/// Largest sample count a time conversion will produce.
///
/// Leaves headroom so `count + 1` fits even on 32-bit targets.
pub const MAX_SAMPLE_COUNT: usize = (u32::MAX - 1) as usize;

/// Smallest history ring we will build: one write slot plus lags 1 and 2, so
/// a `[min, min + 1]` delay range always fits.
pub const MIN_RING_CAPACITY: usize = 3;

// --------------------------------- Conversions -----------------------------------

/// Convert a duration in seconds to a whole number of samples.
///
/// `round(seconds * sample_rate)`, with negatives and NaN mapped to 0 and the
/// result saturated at [`MAX_SAMPLE_COUNT`].
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn seconds_to_samples(seconds: f32, sample_rate: u32) -> usize {
    let n = m_round(seconds * sample_rate as f32);
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= MAX_SAMPLE_COUNT as f32 {
        MAX_SAMPLE_COUNT
    } else {
        n as usize
    }
}

/// Capacity of a history ring able to look back `max_seconds`:
/// `1 + floor(max_seconds * sample_rate)`, never below [`MIN_RING_CAPACITY`].
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn ring_capacity(max_seconds: f32, sample_rate: u32) -> usize {
    let n = m_floor(max_seconds * sample_rate as f32);
    let n = if n.is_nan() || n <= 0.0 {
        0
    } else if n >= MAX_SAMPLE_COUNT as f32 {
        MAX_SAMPLE_COUNT
    } else {
        n as usize
    };
    (n + 1).max(MIN_RING_CAPACITY)
}

/// Stereo to mono: the mean of both channels.
#[inline]
pub fn downmix(left: f32, right: f32) -> f32 {
    0.5 * (left + right)
}

// --------------------------------- Interpolation ---------------------------------

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Geometric interpolation `exp(lerp(ln a, ln b, t))`.
///
/// Only meaningful for strictly positive bounds; otherwise falls back to [`lerp`].
#[inline]
pub fn log_lerp(a: f32, b: f32, t: f32) -> f32 {
    if a > 0.0 && b > 0.0 {
        m_exp(lerp(m_ln(a), m_ln(b), t))
    } else {
        lerp(a, b, t)
    }
}

// --------------------------------- Tests (std only) ------------------------------

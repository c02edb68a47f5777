//! Grain amplitude window.
//!
//! Grains are shaped by a parabola over their normalized position
//! `t = cursor / length`:
//!
//! ```text
//! w(t) = 1 - (2t - 1)^2
//! ```
//!
//! which is 0 at both edges and peaks at 1 in the middle. It is cheap (two
//! multiplies, no table) and continuous, so grains start and stop without clicks.

/// Parabolic window at normalized position `t`.
///
/// Defined for `t` in `[0, 1]`; outside that range the result goes negative,
/// callers keep `t` in range.
#[inline]
pub fn parabolic(t: f32) -> f32 {
    let x = 2.0 * t - 1.0;
    1.0 - x * x
}

/// Window value for a grain at `cursor` of `length` samples.
///
/// A zero-length grain never sounds, so it yields 0 rather than dividing by zero.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn grain_window(cursor: usize, length: usize) -> f32 {
    if length == 0 || cursor >= length {
        return 0.0;
    }
    parabolic(cursor as f32 / length as f32)
}

#![cfg_attr(not(feature = "std"), no_std)]
//! tapgrain core: no_std-ready DSP primitives for the granular delay engine.
//!
//! Features
//! - `std`       : (default) use the Rust standard library
//! - `no-std`    : build with `#![no_std]` and use `libm` for rounding/exp/ln
//! - `micromath` : use `micromath` as the math backend instead
//!
//! Modules
//! - [`dsp`]      : math backend, time/sample conversions, interpolation helpers
//! - [`envelope`] : the parabolic grain window
//! - [`ring`]     : fixed-capacity history ring over caller-provided storage
//!
//! Design
//! - No heap allocations; storage is always handed in by the owner
//! - Every index computed here stays inside the storage it addresses

pub mod dsp;
pub mod envelope;
pub mod ring;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        downmix, lerp, log_lerp, ring_capacity, seconds_to_samples, MAX_SAMPLE_COUNT,
        MIN_RING_CAPACITY,
    };
    pub use crate::envelope::{grain_window, parabolic};
    pub use crate::ring::HistoryRing;
}

//! Control values and the per-block parameter resolver.
//!
//! The host hands in raw control values ([`Controls`]) which may be anything:
//! out of range, inverted, NaN. Once per block they are resolved into an
//! immutable [`GrainParams`] snapshot whose every range is non-empty, so the
//! random draws in the scheduler can never see a zero-width interval and the
//! delay draw can never leave the history ring.

use rand::Rng;
use tapgrain_core::dsp::seconds_to_samples;

use crate::ports::Port;

/// Minimum width of a gain range.
pub const GAIN_EPSILON: f32 = 0.001;

/// Largest per-grain gain (+24 dB). Keeps `min + GAIN_EPSILON` distinct from
/// `min` in `f32`.
pub const MAX_GAIN: f32 = 16.0;

// --------------------------------- Controls --------------------------------------

/// Raw control-port values, one per control port, in host units (seconds,
/// linear gain, slot count).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Controls {
    pub min_delay: f32,
    pub max_delay: f32,
    pub min_length: f32,
    pub max_length: f32,
    pub min_cooldown: f32,
    pub max_cooldown: f32,
    pub min_gain: f32,
    pub max_gain: f32,
    pub slots: f32,
    pub master_gain: f32,
}

impl Default for Controls {
    fn default() -> Self {
        let d = port_default;
        Self {
            min_delay: d(Port::MinDelay),
            max_delay: d(Port::MaxDelay),
            min_length: d(Port::MinLength),
            max_length: d(Port::MaxLength),
            min_cooldown: d(Port::MinCooldown),
            max_cooldown: d(Port::MaxCooldown),
            min_gain: d(Port::MinGain),
            max_gain: d(Port::MaxGain),
            slots: d(Port::Slots),
            master_gain: d(Port::MasterGain),
        }
    }
}

#[inline]
fn port_default(port: Port) -> f32 {
    port.descriptor().hint.default_value().unwrap_or(0.0)
}

impl Controls {
    fn slot(&self, port: Port) -> Option<&f32> {
        Some(match port {
            Port::MinDelay => &self.min_delay,
            Port::MaxDelay => &self.max_delay,
            Port::MinLength => &self.min_length,
            Port::MaxLength => &self.max_length,
            Port::MinCooldown => &self.min_cooldown,
            Port::MaxCooldown => &self.max_cooldown,
            Port::MinGain => &self.min_gain,
            Port::MaxGain => &self.max_gain,
            Port::Slots => &self.slots,
            Port::MasterGain => &self.master_gain,
            Port::LeftInput | Port::RightInput | Port::LeftOutput | Port::RightOutput => {
                return None
            }
        })
    }

    /// Value of a control port; `None` for audio ports.
    #[inline]
    pub fn get(&self, port: Port) -> Option<f32> {
        self.slot(port).copied()
    }

    /// Set a control port. Returns `false` (and changes nothing) for audio ports.
    pub fn set(&mut self, port: Port, value: f32) -> bool {
        let field = match port {
            Port::MinDelay => &mut self.min_delay,
            Port::MaxDelay => &mut self.max_delay,
            Port::MinLength => &mut self.min_length,
            Port::MaxLength => &mut self.max_length,
            Port::MinCooldown => &mut self.min_cooldown,
            Port::MaxCooldown => &mut self.max_cooldown,
            Port::MinGain => &mut self.min_gain,
            Port::MaxGain => &mut self.max_gain,
            Port::Slots => &mut self.slots,
            Port::MasterGain => &mut self.master_gain,
            Port::LeftInput | Port::RightInput | Port::LeftOutput | Port::RightOutput => {
                return false
            }
        };
        *field = value;
        true
    }

    /// Value of `port`, or its declared default when the value is not finite.
    #[inline]
    fn finite(&self, port: Port) -> f32 {
        match self.get(port) {
            Some(v) if v.is_finite() => v,
            _ => port_default(port),
        }
    }
}

// --------------------------------- Ranges ----------------------------------------

/// Half-open range of sample counts `[min, max)` with `max > min`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleRange {
    min: usize,
    max: usize,
}

impl SampleRange {
    /// `[min, max)` widened so that `max >= min + 1`.
    #[inline]
    pub fn widened(min: usize, max: usize) -> Self {
        let min = min.min(usize::MAX - 1);
        Self { min, max: max.max(min + 1) }
    }

    #[inline] pub fn min(&self) -> usize { self.min }
    #[inline] pub fn max(&self) -> usize { self.max }

    /// Uniform integer draw from `[min, max)`.
    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..self.max)
    }
}

/// Gain range `[min, max)` inside `[0, MAX_GAIN + GAIN_EPSILON]` with
/// `max >= min + GAIN_EPSILON`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GainRange {
    min: f32,
    max: f32,
}

impl GainRange {
    #[inline]
    pub fn widened(min: f32, max: f32) -> Self {
        let min = min.clamp(0.0, MAX_GAIN);
        let max = max.min(MAX_GAIN);
        Self { min, max: max.max(min + GAIN_EPSILON) }
    }

    #[inline] pub fn min(&self) -> f32 { self.min }
    #[inline] pub fn max(&self) -> f32 { self.max }

    /// Uniform real draw from `[min, max)`.
    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + rng.gen::<f32>() * (self.max - self.min)
    }
}

// --------------------------------- Snapshot --------------------------------------

/// Resolved, immutable parameter set for one block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GrainParams {
    delay: SampleRange,
    length: SampleRange,
    cooldown: SampleRange,
    gain: GainRange,
    slots: usize,
    master_gain: f32,
}

impl GrainParams {
    /// Resolve `controls` for an engine running at `sample_rate` with a history
    /// ring of `ring_capacity` samples and room for `max_slots` grains.
    ///
    /// `ring_capacity` must be at least 3 (the engine guarantees it); smaller
    /// values are treated as 3.
    pub fn resolve(
        controls: &Controls,
        sample_rate: u32,
        ring_capacity: usize,
        max_slots: usize,
    ) -> Self {
        let samples = |port: Port| seconds_to_samples(controls.finite(port), sample_rate);

        // every drawn lag must stay within [1, capacity - 2]
        let cap = ring_capacity.max(3);
        let min_delay = samples(Port::MinDelay).clamp(1, cap - 2);
        let max_delay = samples(Port::MaxDelay).clamp(min_delay + 1, cap - 1);

        let slots = controls.finite(Port::Slots).round().max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let slots = (slots as usize).min(max_slots);

        Self {
            delay: SampleRange { min: min_delay, max: max_delay },
            length: SampleRange::widened(samples(Port::MinLength), samples(Port::MaxLength)),
            cooldown: SampleRange::widened(samples(Port::MinCooldown), samples(Port::MaxCooldown)),
            gain: GainRange::widened(controls.finite(Port::MinGain), controls.finite(Port::MaxGain)),
            slots,
            master_gain: controls.finite(Port::MasterGain),
        }
    }

    #[inline] pub fn delay(&self) -> SampleRange { self.delay }
    #[inline] pub fn length(&self) -> SampleRange { self.length }
    #[inline] pub fn cooldown(&self) -> SampleRange { self.cooldown }
    #[inline] pub fn gain(&self) -> GainRange { self.gain }
    #[inline] pub fn slots(&self) -> usize { self.slots }
    #[inline] pub fn master_gain(&self) -> f32 { self.master_gain }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 48_000;
    const CAP: usize = 96_001;

    fn resolve(c: &Controls) -> GrainParams {
        GrainParams::resolve(c, SR, CAP, 64)
    }

    #[test]
    fn seconds_become_sample_counts() {
        let c = Controls {
            min_delay: 0.1,
            max_delay: 0.2,
            min_length: 0.01,
            max_length: 0.05,
            min_cooldown: 0.001,
            max_cooldown: 0.5,
            min_gain: 0.2,
            max_gain: 0.8,
            slots: 8.0,
            master_gain: 0.5,
        };
        let p = resolve(&c);
        assert_eq!((p.delay().min(), p.delay().max()), (4800, 9600));
        assert_eq!((p.length().min(), p.length().max()), (480, 2400));
        assert_eq!((p.cooldown().min(), p.cooldown().max()), (48, 24_000));
        assert_eq!((p.gain().min(), p.gain().max()), (0.2, 0.8));
        assert_eq!(p.slots(), 8);
        assert_eq!(p.master_gain(), 0.5);
    }

    #[test]
    fn equal_bounds_are_widened() {
        let c = Controls {
            min_delay: 0.1,
            max_delay: 0.1,
            min_length: 0.01,
            max_length: 0.01,
            min_cooldown: 0.0,
            max_cooldown: 0.0,
            min_gain: 1.0,
            max_gain: 1.0,
            ..Controls::default()
        };
        let p = resolve(&c);
        assert_eq!((p.delay().min(), p.delay().max()), (4800, 4801));
        assert_eq!((p.length().min(), p.length().max()), (480, 481));
        assert_eq!((p.cooldown().min(), p.cooldown().max()), (0, 1));
        assert!(p.gain().max() - p.gain().min() >= GAIN_EPSILON * 0.999);
    }

    #[test]
    fn inverted_bounds_are_widened_from_min() {
        let c = Controls {
            min_length: 0.5,
            max_length: 0.1,
            min_gain: 0.9,
            max_gain: 0.1,
            ..Controls::default()
        };
        let p = resolve(&c);
        assert_eq!((p.length().min(), p.length().max()), (24_000, 24_001));
        assert!(p.gain().min() == 0.9 && p.gain().max() > 0.9);
    }

    #[test]
    fn delay_never_leaves_the_ring() {
        let c = Controls { min_delay: 0.0, max_delay: 100.0, ..Controls::default() };
        let p = resolve(&c);
        assert_eq!(p.delay().min(), 1);
        assert_eq!(p.delay().max(), CAP - 1);

        let c = Controls { min_delay: 100.0, max_delay: 0.0, ..Controls::default() };
        let p = resolve(&c);
        assert_eq!((p.delay().min(), p.delay().max()), (CAP - 2, CAP - 1));

        // tiny ring
        let p = GrainParams::resolve(&Controls::default(), SR, 3, 64);
        assert_eq!((p.delay().min(), p.delay().max()), (1, 2));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let c = Controls {
            min_delay: f32::NAN,
            max_delay: f32::INFINITY,
            min_gain: f32::NEG_INFINITY,
            slots: f32::NAN,
            master_gain: f32::NAN,
            ..Controls::default()
        };
        let p = resolve(&c);
        let d = resolve(&Controls::default());
        assert_eq!(p.delay(), d.delay());
        assert_eq!(p.gain(), d.gain());
        assert_eq!(p.slots(), 1);
        assert_eq!(p.master_gain(), d.master_gain());
    }

    #[test]
    fn slots_are_rounded_and_clamped() {
        let with = |slots: f32| resolve(&Controls { slots, ..Controls::default() }).slots();
        assert_eq!(with(2.6), 3);
        assert_eq!(with(-4.0), 0);
        assert_eq!(with(1000.0), 64);
        assert_eq!(GrainParams::resolve(&Controls { slots: 10.0, ..Controls::default() }, SR, CAP, 4).slots(), 4);
    }

    #[test]
    fn negative_gain_is_clamped_to_zero() {
        let p = resolve(&Controls { min_gain: -1.0, max_gain: -0.5, ..Controls::default() });
        assert_eq!(p.gain().min(), 0.0);
        assert!((p.gain().max() - GAIN_EPSILON).abs() < 1e-9);
    }

    #[test]
    fn huge_gains_keep_a_nonzero_range() {
        for g in [1.0e4_f32, 1.0e8, f32::MAX] {
            let p = resolve(&Controls { min_gain: g, max_gain: g, ..Controls::default() });
            let width = p.gain().max() - p.gain().min();
            assert!(width >= 0.000_99, "gain {g}: width {width}");
            assert_eq!(p.gain().min(), MAX_GAIN);
        }
        let p = resolve(&Controls { min_gain: 0.5, max_gain: 1.0e8, ..Controls::default() });
        assert_eq!((p.gain().min(), p.gain().max()), (0.5, MAX_GAIN));
    }

    #[test]
    fn draws_stay_inside_ranges() {
        use rand::{rngs::SmallRng, SeedableRng};
        let mut rng = SmallRng::seed_from_u64(7);
        let r = SampleRange::widened(10, 10);
        let g = GainRange::widened(0.5, 0.5);
        for _ in 0..1000 {
            assert_eq!(r.draw(&mut rng), 10);
            let x = g.draw(&mut rng);
            assert!((0.5..=0.501).contains(&x), "x={x}");
        }
    }

    #[test]
    fn controls_get_set_by_port() {
        let mut c = Controls::default();
        assert!(c.set(Port::Slots, 12.0));
        assert_eq!(c.get(Port::Slots), Some(12.0));
        assert!(!c.set(Port::LeftInput, 1.0));
        assert_eq!(c.get(Port::RightOutput), None);
    }
}

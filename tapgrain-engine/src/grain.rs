//! Grain record and its per-tick state machine.
//!
//! A grain is one slot of the pool. Each tick it is in one of two states:
//!
//! - **cooldown** (`cooldown > 0`): count down, stay silent;
//! - **playing** (`cooldown == 0`, `cursor < length`): read the history ring at
//!   the grain's fixed lag, shape it with the parabolic window and advance.
//!
//! When a playing grain reaches `cursor == length` the next tick respawns it:
//! fresh offset/length/gain/cooldown/pan are drawn and the grain goes back into
//! cooldown. The respawn tick itself is silent.

use rand::Rng;
use tapgrain_core::envelope::grain_window;
use tapgrain_core::ring::HistoryRing;

use crate::params::GrainParams;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Grain {
    offset: usize,
    length: usize,
    gain: f32,
    pan: f32,
    cursor: usize,
    cooldown: usize,
}

impl Grain {
    /// Sample lag into the history ring.
    #[inline] pub fn offset(&self) -> usize { self.offset }
    /// Duration in samples.
    #[inline] pub fn length(&self) -> usize { self.length }
    #[inline] pub fn gain(&self) -> f32 { self.gain }
    /// Left weight in `[0, 1)`; the right channel gets `1 - pan`.
    #[inline] pub fn pan(&self) -> f32 { self.pan }
    /// Position within the grain, always in `[0, length]`.
    #[inline] pub fn cursor(&self) -> usize { self.cursor }
    /// Remaining silent ticks.
    #[inline] pub fn cooldown(&self) -> usize { self.cooldown }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.cooldown == 0 && self.cursor < self.length
    }

    /// Draw a fresh parameter set and re-enter cooldown.
    ///
    /// Draw order is fixed (offset, length, gain, cooldown, pan) so a seeded
    /// generator yields the same grains on every run.
    pub(crate) fn respawn<R: Rng + ?Sized>(&mut self, params: &GrainParams, rng: &mut R) {
        self.offset = params.delay().draw(rng);
        self.length = params.length().draw(rng);
        self.gain = params.gain().draw(rng);
        self.cooldown = params.cooldown().draw(rng);
        self.pan = rng.gen::<f32>();
        self.cursor = 0;
    }

    /// Advance one tick. Returns the windowed, gain-scaled sample while
    /// playing and `None` while silent.
    #[inline]
    pub(crate) fn tick<S, R>(
        &mut self,
        ring: &HistoryRing<S>,
        params: &GrainParams,
        rng: &mut R,
    ) -> Option<f32>
    where
        S: AsRef<[f32]> + AsMut<[f32]>,
        R: Rng + ?Sized,
    {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }
        if self.cursor >= self.length {
            self.respawn(params, rng);
            return None;
        }
        let env = grain_window(self.cursor, self.length);
        let sample = ring.read(self.offset) * env * self.gain;
        self.cursor += 1;
        Some(sample)
    }
}

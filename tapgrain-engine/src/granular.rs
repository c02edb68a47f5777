//! The granular engine.
//!
//! `Granular` owns the history ring, the grain pool and its own random
//! generator. Per block:
//!
//! 1. the caller resolves control values into a [`GrainParams`] snapshot
//!    ([`Granular::resolve`]);
//! 2. [`Granular::process`] grows the pool if more slots were requested, then
//!    for every frame pushes the downmixed input into the ring, steps every
//!    active grain and mixes their contributions into one stereo frame.
//!
//! Nothing in the block path allocates, locks, logs or fails.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tapgrain_core::dsp::{downmix, ring_capacity};
use tapgrain_core::ring::HistoryRing;

use crate::config::GranularConfig;
use crate::error::{EngineError, Result};
use crate::grain::Grain;
use crate::mixer::StereoMix;
use crate::params::{Controls, GrainParams};
use crate::pool::GrainPool;

pub struct Granular<R = SmallRng> {
    sample_rate: u32,
    ring: HistoryRing<Vec<f32>>,
    pool: GrainPool,
    rng: R,
}

impl<R> core::fmt::Debug for Granular<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Granular")
            .field("sample_rate", &self.sample_rate)
            .field("ring_capacity", &self.ring.capacity())
            .field("max_slots", &self.pool.capacity())
            .field("initialized_slots", &self.pool.initialized())
            .finish_non_exhaustive()
    }
}

impl Granular<SmallRng> {
    /// Build an engine, seeding from `config.seed` or OS entropy.
    pub fn new(sample_rate: u32, config: &GranularConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(sample_rate, config, rng)
    }
}

impl<R: RngCore> Granular<R> {
    /// Build an engine around a caller-supplied generator.
    ///
    /// Ring and pool are reserved here at full size; if either reservation
    /// fails, whatever was already reserved is dropped before returning.
    pub fn with_rng(sample_rate: u32, config: &GranularConfig, rng: R) -> Result<Self> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        config.validate()?;

        let capacity = ring_capacity(config.max_delay_seconds, sample_rate);
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| EngineError::Allocation { what: "history ring", len: capacity })?;
        storage.resize(capacity, 0.0);
        let ring = HistoryRing::from_storage(storage)
            .ok_or(EngineError::Allocation { what: "history ring", len: capacity })?;
        let pool = GrainPool::with_capacity(config.max_slots)?;

        log::debug!(
            "granular engine: {sample_rate} Hz, ring {capacity} samples, {} slots, seed {:?}",
            config.max_slots,
            config.seed
        );

        Ok(Self { sample_rate, ring, pool, rng })
    }

    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }
    #[inline] pub fn ring_capacity(&self) -> usize { self.ring.capacity() }
    #[inline] pub fn max_slots(&self) -> usize { self.pool.capacity() }
    #[inline] pub fn initialized_slots(&self) -> usize { self.pool.initialized() }

    #[inline]
    pub fn grain(&self, index: usize) -> Option<&Grain> {
        self.pool.get(index)
    }

    /// Resolve host control values for this engine's rate, ring and pool.
    #[inline]
    pub fn resolve(&self, controls: &Controls) -> GrainParams {
        GrainParams::resolve(controls, self.sample_rate, self.ring.capacity(), self.pool.capacity())
    }

    /// Process one block of planar stereo audio.
    ///
    /// The block length is the shorter output; input samples past the end of
    /// an input slice read as silence.
    pub fn process(
        &mut self,
        inputs: [&[f32]; 2],
        outputs: [&mut [f32]; 2],
        params: &GrainParams,
    ) {
        let [in_l, in_r] = inputs;
        let [out_l, out_r] = outputs;
        let frames = out_l.len().min(out_r.len());
        self.process_with(
            frames,
            params,
            |i| {
                (
                    in_l.get(i).copied().unwrap_or(0.0),
                    in_r.get(i).copied().unwrap_or(0.0),
                )
            },
            |i, (l, r)| {
                out_l[i] = l;
                out_r[i] = r;
            },
        );
    }

    /// Process `frames` frames, pulling input and pushing output through
    /// callbacks. This is the shared block loop behind [`Granular::process`]
    /// and hosts whose buffers may alias.
    pub fn process_with<I, O>(&mut self, frames: usize, params: &GrainParams, mut input: I, mut output: O)
    where
        I: FnMut(usize) -> (f32, f32),
        O: FnMut(usize, (f32, f32)),
    {
        let active = self.pool.grow(params.slots(), params, &mut self.rng);
        for i in 0..frames {
            let (l, r) = input(i);
            let frame = self.tick(l, r, active, params);
            output(i, frame);
        }
    }

    #[inline]
    fn tick(&mut self, left: f32, right: f32, active: usize, params: &GrainParams) -> (f32, f32) {
        self.ring.push(downmix(left, right));

        let mut mix = StereoMix::default();
        for grain in self.pool.active_mut(active) {
            if let Some(x) = grain.tick(&self.ring, params, &mut self.rng) {
                mix.add(grain.pan(), x);
            }
        }
        mix.finish(params.master_gain())
    }
}

impl<R: RngCore + SeedableRng> Granular<R> {
    /// Replace the generator state. Grains already drawn keep their parameters.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = R::seed_from_u64(seed);
    }
}

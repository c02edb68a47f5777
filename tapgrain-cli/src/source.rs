//! Built-in test signals to granulate.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Impulse,
    Noise,
    Sine,
}

impl SourceKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "impulse" => Some(Self::Impulse),
            "noise" => Some(Self::Noise),
            "sine" => Some(Self::Sine),
            _ => None,
        }
    }
}

/// Mono test source, stepped once per frame.
#[derive(Clone, Debug)]
pub enum Source {
    /// A single-sample click every `period` frames.
    Impulse { period: usize, pos: usize },
    /// 50 ms white-noise bursts, one per second.
    Noise { rng: SmallRng, period: usize, burst: usize, pos: usize },
    /// 220 Hz sine at half scale.
    Sine { phase: f32, inc: f32 },
}

impl Source {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(kind: SourceKind, sample_rate: u32, seed: u64) -> Self {
        let sr = sample_rate.max(1) as usize;
        match kind {
            // 110 ms: just longer than the default maximum delay
            SourceKind::Impulse => Source::Impulse { period: (sr * 11 / 100).max(1), pos: 0 },
            SourceKind::Noise => Source::Noise {
                rng: SmallRng::seed_from_u64(seed),
                period: sr,
                burst: (sr / 20).max(1),
                pos: 0,
            },
            SourceKind::Sine => Source::Sine { phase: 0.0, inc: 220.0 / sr as f32 },
        }
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        match self {
            Source::Impulse { period, pos } => {
                let s = if *pos == 0 { 1.0 } else { 0.0 };
                *pos = (*pos + 1) % *period;
                s
            }
            Source::Noise { rng, period, burst, pos } => {
                let s = if *pos < *burst { rng.gen_range(-0.5..0.5) } else { 0.0 };
                *pos = (*pos + 1) % *period;
                s
            }
            Source::Sine { phase, inc } => {
                let s = 0.5 * (core::f32::consts::TAU * *phase).sin();
                *phase = (*phase + *inc).fract();
                s
            }
        }
    }
}

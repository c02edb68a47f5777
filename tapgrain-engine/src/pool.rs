//! Fixed-capacity grain pool.
//!
//! All `max_slots` grains are reserved up front. The pool tracks how many of
//! them have ever been initialized (a high-water mark); raising the requested
//! count above the mark initializes the new grains into cooldown with freshly
//! drawn parameters, so grains added together enter staggered. Grains above
//! the requested count are simply not stepped: lowering the count freezes them
//! and raising it again resumes them where they stopped.

use rand::Rng;

use crate::error::{EngineError, Result};
use crate::grain::Grain;
use crate::params::GrainParams;

#[derive(Clone, Debug)]
pub struct GrainPool {
    grains: Vec<Grain>,
    initialized: usize,
}

impl GrainPool {
    /// Reserve room for `max_slots` grains.
    pub fn with_capacity(max_slots: usize) -> Result<Self> {
        let mut grains = Vec::new();
        grains
            .try_reserve_exact(max_slots)
            .map_err(|_| EngineError::Allocation { what: "grain pool", len: max_slots })?;
        grains.resize(max_slots, Grain::default());
        Ok(Self { grains, initialized: 0 })
    }

    #[inline] pub fn capacity(&self) -> usize { self.grains.len() }

    /// High-water mark of initialized grains.
    #[inline] pub fn initialized(&self) -> usize { self.initialized }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Grain> {
        self.grains.get(index)
    }

    /// Initialize any grains in `[initialized, requested)` and raise the mark.
    /// Returns the number of grains that will be stepped.
    pub fn grow<R: Rng + ?Sized>(&mut self, requested: usize, params: &GrainParams, rng: &mut R) -> usize {
        let requested = requested.min(self.grains.len());
        if requested > self.initialized {
            for grain in &mut self.grains[self.initialized..requested] {
                grain.respawn(params, rng);
            }
            self.initialized = requested;
        }
        requested
    }

    /// The first `active` grains (capped at capacity).
    #[inline]
    pub fn active_mut(&mut self, active: usize) -> &mut [Grain] {
        let n = active.min(self.grains.len());
        &mut self.grains[..n]
    }
}

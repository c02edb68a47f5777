//! Construction-time configuration.

use crate::error::{EngineError, Result};
use crate::ports::Port;

/// Longest history an engine will reserve: 32 times the "Max. delay" port's
/// upper bound.
pub const MAX_RING_SECONDS: f32 = 64.0;

/// Sizes and seeding fixed when an engine is built.
///
/// Defaults come from the declared port table: 64 slots (upper bound of
/// "Slots") and 2 s of history (upper bound of "Max. delay").
#[derive(Clone, Debug, PartialEq)]
pub struct GranularConfig {
    /// Grain pool capacity.
    pub max_slots: usize,
    /// Longest lag the history ring must hold, in seconds.
    pub max_delay_seconds: f32,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GranularConfig {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn default() -> Self {
        Self {
            max_slots: Port::Slots.descriptor().hint.upper as usize,
            max_delay_seconds: Port::MaxDelay.descriptor().hint.upper,
            seed: None,
        }
    }
}

impl GranularConfig {
    #[must_use]
    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    #[must_use]
    pub fn with_max_delay_seconds(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_slots == 0 {
            return Err(EngineError::InvalidConfig("max_slots must be at least 1"));
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds <= 0.0 {
            return Err(EngineError::InvalidConfig("max_delay_seconds must be finite and positive"));
        }
        if self.max_delay_seconds > MAX_RING_SECONDS {
            return Err(EngineError::InvalidConfig("max_delay_seconds exceeds 64 s"));
        }
        Ok(())
    }
}

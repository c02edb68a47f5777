//! Pan-weighted stereo accumulation.
//!
//! Grains are panned linearly: a grain with pan `p` sends `p * x` left and
//! `(1 - p) * x` right. The accumulated pair is scaled once by the master gain.

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StereoMix {
    left: f32,
    right: f32,
}

impl StereoMix {
    #[inline]
    pub fn add(&mut self, pan: f32, x: f32) {
        self.left += pan * x;
        self.right += (1.0 - pan) * x;
    }

    /// Final `(left, right)` pair after master gain.
    #[inline]
    pub fn finish(self, master_gain: f32) -> (f32, f32) {
        (self.left * master_gain, self.right * master_gain)
    }
}

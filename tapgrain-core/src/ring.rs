//! Fixed-capacity history ring.
//!
//! A circular store of the most recent `capacity` mono samples. The owner hands
//! in the storage once (a boxed slice on hosted targets, a plain array on
//! embedded ones); the ring never grows, shrinks or reallocates.
//!
//! Timing contract
//! - `push` writes at the cursor, then advances it.
//! - `read(lag)` looks back from the *current* tick: `read(1)` is the sample
//!   pushed most recently, `read(capacity - 1)` the oldest one still valid.
//! - `read(0)` aliases the stale slot that the next `push` overwrites; callers
//!   keep lags in `[1, capacity - 1]`.

#[derive(Clone, Debug)]
pub struct HistoryRing<S> {
    samples: S,
    cursor: usize,
}

impl<S> HistoryRing<S>
where
    S: AsRef<[f32]> + AsMut<[f32]>,
{
    /// Wrap `samples` as a ring. The storage length is the capacity.
    ///
    /// Returns `None` for empty storage.
    pub fn from_storage(samples: S) -> Option<Self> {
        if samples.as_ref().is_empty() {
            return None;
        }
        Some(Self { samples, cursor: 0 })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.as_ref().len()
    }

    /// Index of the next write slot.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Absorb one sample and advance the write cursor.
    #[inline]
    pub fn push(&mut self, sample: f32) {
        let cap = self.capacity();
        self.samples.as_mut()[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == cap {
            self.cursor = 0;
        }
    }

    /// Sample pushed `lag` ticks ago (see the module docs for the lag convention).
    ///
    /// Lags at or beyond the capacity wrap around instead of indexing out of bounds.
    #[inline]
    pub fn read(&self, lag: usize) -> f32 {
        let cap = self.capacity();
        let lag = lag % cap;
        let mut index = self.cursor + cap - lag;
        if index >= cap {
            index -= cap;
        }
        self.samples.as_ref()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_storage_is_rejected() {
        let empty: [f32; 0] = [];
        assert!(HistoryRing::from_storage(empty).is_none());
    }

    #[test]
    fn read_returns_value_pushed_lag_ticks_ago() {
        const CAP: usize = 16;
        let mut ring = HistoryRing::from_storage([0.0_f32; CAP]).unwrap();
        for v in 0..CAP {
            ring.push(v as f32);
        }
        // the last push (value CAP-1) is lag 1
        for lag in 1..CAP {
            assert_eq!(ring.read(lag), (CAP - lag) as f32, "lag={lag}");
        }
    }

    #[test]
    fn cursor_wraps_and_old_values_are_overwritten() {
        let mut ring = HistoryRing::from_storage([0.0_f32; 4]).unwrap();
        for v in 0..10 {
            ring.push(v as f32);
        }
        assert_eq!(ring.cursor(), 10 % 4);
        assert_eq!(ring.read(1), 9.0);
        assert_eq!(ring.read(3), 7.0);
        // lag 0 is the stale slot about to be overwritten
        assert_eq!(ring.read(0), 6.0);
    }

    #[test]
    fn oversized_lags_stay_in_bounds() {
        let mut ring = HistoryRing::from_storage([0.0_f32; 5]).unwrap();
        ring.push(1.0);
        let _ = ring.read(usize::MAX);
        let _ = ring.read(5);
    }
}

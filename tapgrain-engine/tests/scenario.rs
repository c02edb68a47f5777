//! End-to-end: one slot, fixed 100 ms lag, fixed 10 ms grains, no cooldown.
//!
//! With cooldown 0 the grain cycle is 481 ticks: 480 playing ticks followed by
//! one silent respawn tick. At tick `n` the grain is at cursor `n % 481` and
//! reads the input pushed 4799 ticks earlier (lag 1 is the current tick).

use rand::RngCore;
use tapgrain_core::envelope::parabolic;
use tapgrain_engine::{Controls, Granular, GranularConfig};

const SR: u32 = 48_000;
const LAG: usize = 4800;
const LENGTH: usize = 480;
const CYCLE: usize = LENGTH + 1;
const PERIOD: usize = 5280;
const BLOCK: usize = 256;

fn controls() -> Controls {
    Controls {
        min_delay: 0.1,
        max_delay: 0.1,
        min_length: 0.01,
        max_length: 0.01,
        min_cooldown: 0.0,
        max_cooldown: 0.0,
        min_gain: 1.0,
        max_gain: 1.0,
        slots: 1.0,
        master_gain: 1.0,
    }
}

fn render(input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut g = Granular::new(SR, &GranularConfig::default().with_seed(2024)).unwrap();
    render_with(&mut g, input)
}

fn render_with<R: RngCore>(g: &mut Granular<R>, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let p = g.resolve(&controls());
    assert_eq!((p.delay().min(), p.length().min(), p.cooldown().min()), (LAG, LENGTH, 0));

    let mut left = vec![0.0; input.len()];
    let mut right = vec![0.0; input.len()];
    for ((i, l), r) in input.chunks(BLOCK).zip(left.chunks_mut(BLOCK)).zip(right.chunks_mut(BLOCK)) {
        g.process([i, i], [l, r], &p);
    }
    (left, right)
}

/// Fixed-output generator: integer draws land on the low end of their range,
/// unit floats on exactly 0.5.
struct Centered;

impl RngCore for Centered {
    fn next_u32(&mut self) -> u32 {
        0x8000_0000
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn impulse_train(total: usize) -> Vec<f32> {
    (0..total).map(|n| if n % PERIOD == 0 { 1.0 } else { 0.0 }).collect()
}

fn window_at(n: usize) -> f32 {
    let phase = n % CYCLE;
    if phase == LENGTH {
        0.0
    } else {
        parabolic(phase as f32 / LENGTH as f32)
    }
}

fn assert_close(got: f32, want: f32, n: usize) {
    // gain is drawn from [1, 1.001)
    let tol = 0.0011 * want.abs() + 1e-6;
    assert!((got - want).abs() <= tol, "tick {n}: got {got}, want {want}");
}

#[test]
fn impulse_train_echoes_after_the_lag() {
    let total = PERIOD * 5;
    let input = impulse_train(total);
    let (left, right) = render(&input);

    for n in 0..total {
        let (l, r) = (left[n], right[n]);
        assert!(l >= 0.0 && r >= 0.0, "tick {n}: pan weights must be non-negative");

        let source = (n + 1).checked_sub(LAG).map_or(0.0, |k| input[k]);
        assert_close(l + r, source * window_at(n), n);
    }

    // every echo lands exactly LAG - 1 ticks after its impulse
    let mut echoes = 0;
    for k in (0..total).step_by(PERIOD) {
        let n = k + LAG - 1;
        if n < total && window_at(n) > 0.0 {
            assert!(left[n] + right[n] > 0.0, "missing echo at {n}");
            echoes += 1;
        }
    }
    assert!(echoes >= 4);
}

#[test]
fn steady_input_yields_parabolic_grains_split_by_pan() {
    let total = LAG + CYCLE * 6;
    let input = vec![1.0_f32; total];
    let (left, right) = render(&input);

    // nothing reaches the output before the ring holds LAG samples of history
    assert!(left[..LAG - 1].iter().chain(&right[..LAG - 1]).all(|&x| x == 0.0));

    for n in LAG - 1..total {
        let mono = left[n] + right[n];
        assert_close(mono, window_at(n), n);
    }

    // within one grain the pan is fixed: the left share is constant
    let start = (LAG / CYCLE + 1) * CYCLE;
    let share = left[start + LENGTH / 2] / (left[start + LENGTH / 2] + right[start + LENGTH / 2]);
    for n in start + 1..start + LENGTH {
        let mono = left[n] + right[n];
        assert!((left[n] - share * mono).abs() < 1e-5, "tick {n}");
    }
    // the peak of each grain is (about) unity
    assert_close(left[start + LENGTH / 2] + right[start + LENGTH / 2], 1.0, start + LENGTH / 2);
}

#[test]
fn centered_pan_splits_the_echo_equally() {
    let total = PERIOD * 5;
    let input = impulse_train(total);
    let mut g = Granular::with_rng(SR, &GranularConfig::default(), Centered).unwrap();
    let (left, right) = render_with(&mut g, &input);
    assert_eq!(g.grain(0).unwrap().pan(), 0.5);

    for n in 0..total {
        assert_eq!(left[n].to_bits(), right[n].to_bits(), "tick {n}: channels differ");
        let source = (n + 1).checked_sub(LAG).map_or(0.0, |k| input[k]);
        assert_close(left[n] + right[n], source * window_at(n), n);
    }

    let mut echoes = 0;
    for k in (0..total).step_by(PERIOD) {
        let n = k + LAG - 1;
        if n < total && window_at(n) > 0.0 {
            // gain is the middle of [1, 1.001)
            let want = 0.5 * window_at(n) * 1.0005;
            assert!((left[n] - want).abs() < 1e-6, "tick {n}: got {}, want {want}", left[n]);
            echoes += 1;
        }
    }
    assert!(echoes >= 4);
}

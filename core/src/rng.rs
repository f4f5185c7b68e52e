//! Injectable randomness.
//!
//! RULE: Nothing in the core may call a platform RNG. Pattern generation
//! draws from a `RandomSource` handed in by the caller, so tests can pin
//! every choice.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A source of uniform floats in [0.0, 1.0).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Roll an index in [0, n). `n` must be > 0.
    fn next_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an index proportionally to `weights`. Returns None when no
    /// weight is positive.
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.next_f64() * total;
        let mut last = None;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            if roll < *w {
                return Some(i);
            }
            roll -= *w;
            last = Some(i);
        }
        last
    }
}

/// Seeded PCG stream.
pub struct PcgSource {
    inner: Pcg64Mcg,
}

impl PcgSource {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }
}

impl RandomSource for PcgSource {
    fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
/// Values outside [0, 1) are clamped into range.
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic_and_in_range() {
        let mut a = PcgSource::new(12345);
        let mut b = PcgSource::new(12345);
        for _ in 0..1000 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn weighted_pick_respects_zero_weights() {
        let mut rng = ScriptedSource::new(vec![0.0, 0.5, 0.99]);
        for _ in 0..3 {
            assert_eq!(rng.pick_weighted(&[0.0, 2.0, 0.0]), Some(1));
        }
        assert_eq!(rng.pick_weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn weighted_pick_splits_by_weight() {
        let mut rng = ScriptedSource::new(vec![0.1, 0.3]);
        // total 4: [0,1) -> 0, [1,4) -> 1
        assert_eq!(rng.pick_weighted(&[1.0, 3.0]), Some(0));
        assert_eq!(rng.pick_weighted(&[1.0, 3.0]), Some(1));
    }

    #[test]
    fn next_below_stays_in_bounds() {
        let mut rng = ScriptedSource::constant(0.999_999);
        assert_eq!(rng.next_below(4), 3);
    }
}

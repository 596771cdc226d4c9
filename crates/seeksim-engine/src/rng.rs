//! Deterministic random numbers for the simulation.
//!
//! Every random decision in a run (file layout, request kinds, access style,
//! sector picks, per-second budgets) is drawn from a single [`UniformSource`]
//! owned by the simulation, so a run is fully reproducible from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Redraws allowed before [`exponential_budget`] settles on a budget of 1.
pub const MAX_BUDGET_REDRAWS: u32 = 100;

/// A source of uniform doubles in `[0, 1)`.
pub trait UniformSource {
    /// Returns the next uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns `floor(u * n)`, an index in `0..n`. `n` must be non-zero.
    fn below(&mut self, n: usize) -> usize {
        let idx = (self.next_f64() * n as f64) as usize;
        idx.min(n.saturating_sub(1))
    }

    /// Returns true with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fair coin.
    fn coin(&mut self) -> bool {
        self.chance(0.5)
    }
}

/// Seeded ChaCha8 stream used by every simulation run.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl SimRng {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Returns the seed this generator was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of samples drawn so far.
    #[inline]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl UniformSource for SimRng {
    fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
///
/// Handy for pinning individual random decisions in tests.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    next: usize,
}

impl SequenceSource {
    /// Creates a source replaying `values`. An empty list always yields 0.0.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }
}

impl UniformSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

/// Draws a per-second request budget from an exponential transform of the
/// uniform stream: `floor(max - (ln(1 - u) / -lambda) * max)`.
///
/// Draws below 1 are redrawn; after [`MAX_BUDGET_REDRAWS`] failed redraws the
/// budget is 1.
pub fn exponential_budget<R: UniformSource + ?Sized>(max: u32, lambda: f64, rng: &mut R) -> u32 {
    let max_f = f64::from(max);
    for _ in 0..=MAX_BUDGET_REDRAWS {
        let u = rng.next_f64();
        let value = (max_f - ((1.0 - u).ln() / -lambda) * max_f).floor();
        if value >= 1.0 {
            return value as u32;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::new(2);
        let mut b = SimRng::new(2);
        for _ in 0..64 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
        assert_eq!(a.draws(), 64);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let same = (0..16).all(|_| a.next_f64() == b.next_f64());
        assert!(!same);
    }

    #[test]
    fn test_samples_in_unit_interval() {
        let mut rng = SimRng::new(99);
        for _ in 0..10_000 {
            let u = rng.next_f64();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_below_bounds() {
        let mut src = SequenceSource::new(vec![0.0, 0.34, 0.999_999]);
        assert_eq!(src.below(3), 0);
        assert_eq!(src.below(3), 1);
        assert_eq!(src.below(3), 2);
    }

    #[test]
    fn test_sequence_source_cycles() {
        let mut src = SequenceSource::new(vec![0.1, 0.2]);
        assert_eq!(src.next_f64(), 0.1);
        assert_eq!(src.next_f64(), 0.2);
        assert_eq!(src.next_f64(), 0.1);

        let mut empty = SequenceSource::new(Vec::new());
        assert_eq!(empty.next_f64(), 0.0);
    }

    #[test]
    fn test_budget_at_zero_draw_is_max() {
        let mut src = SequenceSource::new(vec![0.0]);
        assert_eq!(exponential_budget(20, 2.0, &mut src), 20);
    }

    #[test]
    fn test_budget_redraws_invalid_values() {
        // u = 0.99 gives ln(0.01)/2 ≈ 2.3 → 20 - 46 < 1, redrawn; u = 0.5 gives 13.
        let mut src = SequenceSource::new(vec![0.99, 0.5]);
        assert_eq!(exponential_budget(20, 2.0, &mut src), 13);
    }

    #[test]
    fn test_budget_falls_back_to_one() {
        let mut src = SequenceSource::new(vec![0.999]);
        assert_eq!(exponential_budget(20, 2.0, &mut src), 1);
    }

    #[test]
    fn test_budget_never_exceeds_max() {
        let mut rng = SimRng::new(7);
        for _ in 0..1_000 {
            let budget = exponential_budget(20, 2.0, &mut rng);
            assert!((1..=20).contains(&budget));
        }
    }
}

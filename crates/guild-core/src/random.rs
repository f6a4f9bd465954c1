//! Injectable randomness for the action generator.
//!
//! [`RandomSource`] is the only way the generator draws random values.
//! Every [`rand::RngCore`] implements it, so production code passes a
//! seeded `StdRng`; tests pass a [`ScriptedRandom`] to force exact
//! outcomes.

use std::collections::VecDeque;

use rand::Rng;

/// A source of uniform random draws.
pub trait RandomSource: Send {
    /// Draw a value uniformly from `[0.0, 1.0)`.
    fn roll(&mut self) -> f64;

    /// Draw an index uniformly from `0..len`. Returns 0 when `len` is 0.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: rand::RngCore + Send> RandomSource for R {
    fn roll(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.random_range(0..len)
    }
}

/// A random source that replays queued values.
///
/// Rolls and picks are consumed from separate queues. An exhausted roll
/// queue yields `0.0` and an exhausted pick queue yields `0`. Picks are
/// reduced modulo `len` so any queued index is valid.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    rolls: VecDeque<f64>,
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue values returned by successive [`RandomSource::roll`] calls.
    #[must_use]
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = f64>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queue values returned by successive [`RandomSource::pick`] calls.
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.0)
    }

    fn pick(&mut self, len: usize) -> usize {
        let raw = self.picks.pop_front().unwrap_or(0);
        raw.checked_rem(len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn scripted_replays_in_order() {
        let mut rng = ScriptedRandom::new()
            .with_rolls([0.9, 0.1])
            .with_picks([4, 7]);
        assert!((rng.roll() - 0.9).abs() < f64::EPSILON);
        assert!((rng.roll() - 0.1).abs() < f64::EPSILON);
        assert_eq!(rng.pick(5), 4);
        // 7 % 5
        assert_eq!(rng.pick(5), 2);
    }

    #[test]
    fn scripted_defaults_when_exhausted() {
        let mut rng = ScriptedRandom::new();
        assert!(rng.roll().abs() < f64::EPSILON);
        assert_eq!(rng.pick(6), 0);
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn std_rng_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let roll = rng.roll();
            assert!((0.0..1.0).contains(&roll));
            assert!(rng.pick(6) < 6);
        }
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            assert_eq!(a.pick(1000), b.pick(1000));
        }
    }
}

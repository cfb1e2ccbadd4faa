//! Randomness seam for the round engine

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of every random decision the engine makes
pub trait Dice: Send {
    /// Uniform value in `[0, 1)`
    fn roll(&mut self) -> f64;

    /// Uniform index in `0..bound`; returns 0 when `bound` is 0
    fn below(&mut self, bound: usize) -> usize;

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.roll() < p
    }
}

/// Shuffle a slice using Fisher-Yates
pub fn shuffle<T>(dice: &mut dyn Dice, slice: &mut [T]) {
    for i in (1..slice.len()).rev() {
        let j = dice.below(i + 1);
        slice.swap(i, j);
    }
}

/// [`Dice`] backed by any `rand` generator
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng + Send> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> Dice for RngDice<R> {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            0
        } else {
            self.rng.gen_range(0..bound)
        }
    }
}

/// Dice that replays queued values, for tests
#[cfg(test)]
pub(crate) mod scripted {
    use super::Dice;
    use std::collections::VecDeque;

    /// Once a queue runs dry, rolls return 0.99 (never rare) and picks return 0.
    #[derive(Default)]
    pub struct ScriptedDice {
        rolls: VecDeque<f64>,
        picks: VecDeque<usize>,
    }

    impl ScriptedDice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rolls(mut self, rolls: &[f64]) -> Self {
            self.rolls.extend(rolls.iter().copied());
            self
        }

        pub fn with_picks(mut self, picks: &[usize]) -> Self {
            self.picks.extend(picks.iter().copied());
            self
        }
    }

    impl Dice for ScriptedDice {
        fn roll(&mut self) -> f64 {
            self.rolls.pop_front().unwrap_or(0.99)
        }

        fn below(&mut self, bound: usize) -> usize {
            if bound == 0 {
                return 0;
            }
            self.picks.pop_front().unwrap_or(0) % bound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_is_repeatable() {
        let mut a = RngDice::seeded(7);
        let mut b = RngDice::seeded(7);
        for _ in 0..20 {
            assert_eq!(a.below(10), b.below(10));
        }
    }

    #[test]
    fn test_below_zero_bound() {
        let mut dice = RngDice::seeded(1);
        assert_eq!(dice.below(0), 0);
    }

    #[test]
    fn test_chance_zero_never_fires() {
        let mut dice = RngDice::seeded(3);
        assert!((0..1000).all(|_| !dice.chance(0.0)));
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut dice = RngDice::seeded(11);
        let mut values: Vec<u32> = (0..10).collect();
        shuffle(&mut dice, &mut values);
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }
}

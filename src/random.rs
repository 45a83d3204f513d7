//! Uniform and reward-weighted picks backed by the OS entropy source.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Designed probability of returning a reward outcome in weighted mode.
pub const DEFAULT_REWARD_RATE: f64 = 0.22;

// the roll is quantized to 1/10_000
const ROLL_STEPS: u32 = 10_000;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("nothing to pick from")]
    Empty,
}

pub fn uniform<T>(items: &[T]) -> Result<&T, SelectError> {
    uniform_with(&mut OsRng, items)
}

pub fn uniform_with<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [T],
) -> Result<&'a T, SelectError> {
    items.choose(rng).ok_or(SelectError::Empty)
}

pub fn weighted_reward_pick<T>(
    items: &[T],
    is_reward: impl Fn(&T) -> bool,
    reward_rate: f64,
) -> Result<&T, SelectError> {
    weighted_reward_pick_with(&mut OsRng, items, is_reward, reward_rate)
}

/// Roll against `reward_rate`: under it, pick from the reward pool, otherwise
/// from the rest. An empty chosen pool falls back to the other one.
pub fn weighted_reward_pick_with<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [T],
    is_reward: impl Fn(&T) -> bool,
    reward_rate: f64,
) -> Result<&'a T, SelectError> {
    let (rewards, others): (Vec<&T>, Vec<&T>) = items.iter().partition(|item| is_reward(item));
    let roll = f64::from(rng.gen_range(0..ROLL_STEPS)) / f64::from(ROLL_STEPS);

    let (preferred, fallback) =
        if roll < reward_rate { (&rewards, &others) } else { (&others, &rewards) };
    let pool = if preferred.is_empty() { fallback } else { preferred };
    uniform_with(rng, pool).copied()
}

//! Randomized negative income shocks. All draws go through a caller-supplied
//! `Rng` so experiments can be replayed from a seed.

use contracts::ShockRange;
use rand::Rng;

/// Draw a shock that fires with `probability`, uniform over the inclusive
/// range when it does. Probabilities at or beyond the [0, 1] ends degrade to
/// never/always rather than panicking.
pub fn draw_shock(probability: f64, range: ShockRange, rng: &mut impl Rng) -> i64 {
    if probability <= 0.0 {
        return 0;
    }
    if probability < 1.0 && !rng.random_bool(probability) {
        return 0;
    }
    draw_range_shock(range, rng)
}

/// Unconditional uniform draw over the inclusive range. An empty or inverted
/// range collapses to `min`.
pub fn draw_range_shock(range: ShockRange, rng: &mut impl Rng) -> i64 {
    if range.max <= range.min {
        return range.min;
    }
    rng.random_range(range.min..=range.max)
}

/// Subtract a probabilistic shock from `amount`. The result may go negative;
/// downstream validation decides what a non-positive budget means.
pub fn apply_shock(amount: i64, probability: f64, range: ShockRange, rng: &mut impl Rng) -> i64 {
    amount - draw_shock(probability, range, rng)
}

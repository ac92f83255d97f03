//! Aggregate competitor pressure.

use crate::rng::RandomSource;
use sim_core::{CompanyState, RIVALS_MAX, RIVALS_MIN};

pub const RIVAL_STEP: f64 = 0.04;
pub const RIVAL_NOISE: f64 = 0.01;

/// Rivals gain ground when the player's share shrinks and lose it when the
/// share grows. Unchanged share only applies the noise. One draw is always
/// consumed. Returns the new pressure.
pub fn update_rivals<R: RandomSource + ?Sized>(
    state: &mut CompanyState,
    share_before: f64,
    share_after: f64,
    rng: &mut R,
) -> f64 {
    let delta = share_after - share_before;
    let step = if delta < 0.0 {
        RIVAL_STEP
    } else if delta > 0.0 {
        -RIVAL_STEP
    } else {
        0.0
    };
    let noise = rng.uniform_in(-RIVAL_NOISE, RIVAL_NOISE);
    state.rivals_power = (state.rivals_power + step + noise).clamp(RIVALS_MIN, RIVALS_MAX);
    state.rivals_power
}

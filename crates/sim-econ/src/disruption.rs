//! The one-shot "touch revolution" market disruption.
//!
//! Before 2005 nothing can happen. Between 2005 and 2009 the event fires with a
//! probability the player can raise through R&D, product quality and OS
//! maturity. From 2010 on it is forced. Once started the intensity ramps up
//! quickly until 2012 and slowly afterwards, saturating at 1.0.

use crate::rng::RandomSource;
use crate::spend_curve;
use sim_core::CompanyState;

/// First year in which the disruption may start.
pub const EARLIEST_YEAR: i32 = 2005;
/// Last year in which the start is left to chance.
pub const LATEST_RANDOM_YEAR: i32 = 2009;
/// Intensity when the start is forced.
pub const FORCED_INTENSITY: f64 = 0.25;

/// Contribution of the player's investment to the trigger probability.
pub fn player_pull(state: &CompanyState) -> f64 {
    spend_curve(state.rnd_spend) * 0.03
        + f64::from(state.quality.min(100)) / 100.0 * 0.04
        + state.os_maturity / 100.0 * 0.05
}

/// Quarterly trigger probability while the disruption has not started.
pub fn trigger_probability(state: &CompanyState) -> f64 {
    let base = 0.08 + f64::from(state.time.year - EARLIEST_YEAR) * 0.05;
    let rival = 0.10 + (state.rivals_power - 1.0) * 0.06;
    (base + player_pull(state) + rival).clamp(0.08, 0.55)
}

/// Starting intensity; a strong brand absorbs the shift more smoothly.
pub fn initial_intensity(reputation: f64) -> f64 {
    if reputation >= 60.0 {
        0.18
    } else if reputation >= 40.0 {
        0.22
    } else {
        0.28
    }
}

/// Per-quarter intensity growth once started.
pub fn ramp_step(year: i32) -> f64 {
    if year <= 2012 {
        0.08
    } else {
        0.02
    }
}

/// Evaluate the disruption for the current quarter. Returns `true` when the
/// event started during this call.
///
/// A random draw is consumed only while the outcome is actually uncertain
/// (not started, year in 2005..=2009).
pub fn advance_disruption<R: RandomSource + ?Sized>(state: &mut CompanyState, rng: &mut R) -> bool {
    let year = state.time.year;
    if state.disruption.started {
        state.disruption.intensity = (state.disruption.intensity + ramp_step(year)).clamp(0.0, 1.0);
        return false;
    }
    if year < EARLIEST_YEAR {
        return false;
    }
    if year > LATEST_RANDOM_YEAR {
        state.disruption.started = true;
        state.disruption.intensity = FORCED_INTENSITY;
        return true;
    }
    let p = trigger_probability(state);
    if rng.next_unit() < p {
        state.disruption.started = true;
        state.disruption.intensity = initial_intensity(state.reputation);
        return true;
    }
    false
}

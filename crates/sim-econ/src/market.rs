//! Total addressable market by era.

use crate::round_units;
use sim_core::{CompanyState, Disruption};

/// Minimum quarterly market size in units.
pub const MARKET_FLOOR: u64 = 5_000;

/// Piecewise-linear quarterly unit curve before the disruption boost.
pub fn base_market_units(year: i32) -> f64 {
    let y = f64::from(year);
    if year <= 2006 {
        20_000.0 + 1_200.0 * (y - 2000.0)
    } else if year <= 2012 {
        28_000.0 + 6_500.0 * (y - 2007.0)
    } else if year <= 2020 {
        65_000.0 + 2_500.0 * (y - 2013.0)
    } else {
        85_000.0 + 700.0 * (y - 2021.0)
    }
}

/// Multiplier from the disruption; strongest during the initial adoption wave.
pub fn disruption_boost(year: i32, disruption: &Disruption) -> f64 {
    if !disruption.started {
        return 1.0;
    }
    let weight = if year <= 2012 { 0.55 } else { 0.15 };
    1.0 + disruption.intensity.clamp(0.0, 1.0) * weight
}

pub fn total_market_units(year: i32, disruption: &Disruption) -> u64 {
    round_units(base_market_units(year) * disruption_boost(year, disruption)).max(MARKET_FLOOR)
}

/// Market size for the state's current quarter.
pub fn market_units(state: &CompanyState) -> u64 {
    total_market_units(state.time.year, &state.disruption)
}

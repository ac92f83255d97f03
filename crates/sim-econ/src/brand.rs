//! Reputation (brand) updates.

use rust_decimal::Decimal;
use sim_core::{CompanyState, Tier};

/// Quarter outcomes the brand reacts to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReputationInputs {
    pub sold: u64,
    pub demand: u64,
    pub defect_rate: f64,
    pub profit: Decimal,
}

/// Sold / demanded; zero when nothing was demanded.
pub fn sell_through(sold: u64, demand: u64) -> f64 {
    if demand == 0 {
        0.0
    } else {
        sold as f64 / demand as f64
    }
}

/// Unscaled reputation change in whole points.
pub fn raw_delta(state: &CompanyState, inputs: &ReputationInputs) -> i32 {
    let mut delta = 0;

    let st = sell_through(inputs.sold, inputs.demand);
    if st > 0.85 {
        delta += 1;
    } else if st < 0.45 {
        delta -= 1;
    }

    if inputs.defect_rate < 0.03 {
        delta += 1;
    } else if inputs.defect_rate > 0.06 {
        delta -= 2;
    }

    // positioning coherence
    match state.tier {
        Tier::Premium if state.reputation < 50.0 => delta -= 1,
        Tier::Budget if state.reputation > 70.0 => delta -= 1,
        _ => {}
    }

    if inputs.profit > Decimal::ZERO {
        delta += 1;
    } else if inputs.profit < Decimal::ZERO {
        delta -= 1;
    }
    delta
}

/// An established brand moves more slowly.
pub fn tolerance(reputation: f64) -> f64 {
    (1.0 - reputation / 100.0 * 0.55).clamp(0.4, 1.0)
}

/// Apply the quarter's reputation change. Returns the applied delta.
pub fn update_reputation(state: &mut CompanyState, inputs: &ReputationInputs) -> f64 {
    let before = state.reputation;
    let scaled = (f64::from(raw_delta(state, inputs)) * tolerance(before)).round();
    state.reputation = (before + scaled).clamp(0.0, 100.0);
    state.reputation - before
}

//! Component purchasing, production and defects.

use crate::tables::{era_cost_multiplier, segment};
use crate::{money, round_units, to_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{CompanyState, OsMode, Tier};

pub const DEFECT_MIN: f64 = 0.008;
pub const DEFECT_MAX: f64 = 0.12;

/// Fraction of produced units that come out defective.
pub fn defect_rate(state: &CompanyState) -> f64 {
    let mut rate = 0.06;
    rate -= f64::from(state.process_quality.min(100)) / 100.0 * 0.035;
    rate += match state.os_mode {
        OsMode::License => -0.008,
        OsMode::Closed | OsMode::Open => 0.012 - state.os_maturity / 100.0 * 0.020,
    };
    rate += match state.tier {
        Tier::Budget => 0.012,
        Tier::Mainstream => 0.0,
        Tier::Premium => -0.006,
    };
    rate.clamp(DEFECT_MIN, DEFECT_MAX)
}

/// Bill-of-materials cost per unit, rounded to whole currency.
pub fn unit_cost(year: i32, tier: Tier, quality: u8) -> Decimal {
    let q = f64::from(quality.min(100)) / 100.0;
    money(segment(tier).base_bom * (0.9 + q * 0.8) * era_cost_multiplier(year))
}

/// Unit cost for the state's current quarter, tier and quality.
pub fn current_unit_cost(state: &CompanyState) -> Decimal {
    unit_cost(state.time.year, state.tier, state.quality)
}

/// Components bought this quarter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub units: u64,
    pub cost: Decimal,
}

/// Buy the standing component order: stock grows, cash shrinks.
pub fn purchase_components(state: &mut CompanyState, unit_cost: Decimal) -> Purchase {
    let units = state.buy_units;
    let cost = Decimal::from(units) * unit_cost;
    state.stock = state.stock.saturating_add(units);
    state.cash -= cost;
    Purchase { units, cost }
}

/// Outcome of a production run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionRun {
    pub producible: u64,
    pub good_units: u64,
    pub bad_units: u64,
    pub defect_rate: f64,
}

/// Turn components into handsets, bounded by capacity and stock. Defective
/// units are discarded and never return to stock.
pub fn run_production(state: &mut CompanyState) -> ProductionRun {
    let rate = defect_rate(state);
    let producible = u64::from(state.capacity).min(state.stock);
    state.stock -= producible;
    let good_units = round_units(producible as f64 * (1.0 - rate)).min(producible);
    ProductionRun {
        producible,
        good_units,
        bad_units: producible - good_units,
        defect_rate: rate,
    }
}

/// Warranty cost of defective units: 60% of their BOM cost.
pub fn warranty_cost(bad_units: u64, unit_cost: Decimal) -> Decimal {
    money(bad_units as f64 * to_f64(unit_cost) * 0.6)
}

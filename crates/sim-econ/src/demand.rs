//! Unit demand forecast and the read-only attractiveness queries.
//!
//! Demand is the tier's slice of the total market scaled by a chain of
//! multiplicative factors:
//!
//! `units = segment × price × perf × marketing × brand × os × channel × macro × rival`
//!
//! Each factor is exposed individually so the display layer can explain a
//! forecast.

use crate::market::market_units;
use crate::tables::{channel, ideal_price, segment};
use crate::{round_units, spend_curve, to_f64};
use serde::{Deserialize, Serialize};
use sim_core::{CompanyState, OsMode};

/// Price below which the elasticity curve stops rewarding cheaper pricing.
pub const PRICE_FLOOR: f64 = 50.0;

/// Effective price elasticity; a strong brand dampens price sensitivity.
pub fn price_elasticity(state: &CompanyState) -> f64 {
    segment(state.tier).elasticity * (1.05 - (state.reputation / 100.0) * 0.35)
}

pub fn price_factor(state: &CompanyState) -> f64 {
    let price = to_f64(state.price).max(PRICE_FLOOR);
    (segment(state.tier).price_ref / price).powf(price_elasticity(state))
}

pub fn perf_factor(state: &CompanyState) -> f64 {
    0.85 + f64::from(state.quality.min(100)) / 100.0 * segment(state.tier).perf_weight
}

/// Diminishing returns on marketing spend; never below 1.
pub fn marketing_factor(state: &CompanyState) -> f64 {
    1.0 + spend_curve(state.marketing_spend) * 0.22
}

/// In [1.0, 1.5].
pub fn brand_factor(state: &CompanyState) -> f64 {
    1.0 + state.reputation / 200.0
}

pub fn os_factor(state: &CompanyState) -> f64 {
    let maturity = state.os_maturity / 100.0;
    match state.os_mode {
        OsMode::Closed => 0.92 + maturity * 0.25 + state.reputation / 100.0 * 0.12,
        OsMode::Open => 0.95 + maturity * 0.22 + state.dev_ecosystem / 100.0 * 0.10,
        OsMode::License => 1.00 + maturity * 0.05,
    }
}

pub fn rival_factor(state: &CompanyState) -> f64 {
    1.0 / state.rivals_power.max(0.01)
}

/// Every factor of a demand forecast.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandBreakdown {
    pub segment_units: f64,
    pub price: f64,
    pub perf: f64,
    pub marketing: f64,
    pub brand: f64,
    pub os: f64,
    pub channel: f64,
    pub macro_factor: f64,
    pub rival: f64,
    pub units: u64,
}

pub fn demand_breakdown(state: &CompanyState) -> DemandBreakdown {
    let segment_units = market_units(state) as f64 * segment(state.tier).base_share;
    let price = price_factor(state);
    let perf = perf_factor(state);
    let marketing = marketing_factor(state);
    let brand = brand_factor(state);
    let os = os_factor(state);
    let channel = channel(state.channel).demand_factor;
    let macro_factor = state.macro_factor;
    let rival = rival_factor(state);
    let units = round_units(
        segment_units * price * perf * marketing * brand * os * channel * macro_factor * rival,
    );
    DemandBreakdown {
        segment_units,
        price,
        perf,
        marketing,
        brand,
        os,
        channel,
        macro_factor,
        rival,
        units,
    }
}

/// Forecast unit demand for the current quarter.
pub fn estimate_demand(state: &CompanyState) -> u64 {
    demand_breakdown(state).units
}

/// Headline product score in `0..=100`, blending performance, brand, price
/// positioning against the tier's ideal price and OS maturity.
pub fn product_attractiveness(state: &CompanyState) -> u8 {
    let ideal = ideal_price(state.tier);
    let price_gap = ((to_f64(state.price) - ideal).abs() / ideal).clamp(0.0, 1.0);
    let score = f64::from(state.quality.min(100)) * 0.55 + state.reputation * 0.35 - price_gap * 35.0
        + (state.os_maturity / 100.0).clamp(0.0, 1.0) * 8.0;
    score.round().clamp(0.0, 100.0) as u8
}

/// Qualitative market interest derived from attractiveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterestLevel {
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl InterestLevel {
    pub fn from_attractiveness(attract: u8) -> Self {
        match attract {
            85.. => InterestLevel::VeryStrong,
            70..=84 => InterestLevel::Strong,
            55..=69 => InterestLevel::Fair,
            40..=54 => InterestLevel::Weak,
            _ => InterestLevel::VeryWeak,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InterestLevel::VeryWeak => "very weak",
            InterestLevel::Weak => "weak",
            InterestLevel::Fair => "fair",
            InterestLevel::Strong => "strong",
            InterestLevel::VeryStrong => "very strong",
        }
    }
}

pub fn market_interest_level(state: &CompanyState) -> InterestLevel {
    InterestLevel::from_attractiveness(product_attractiveness(state))
}

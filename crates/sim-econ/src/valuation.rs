//! Market share smoothing and fundamentals-based valuation.

use crate::{money, to_f64};
use rust_decimal::Decimal;
use sim_core::{CompanyState, OsMode, SHARE_MAX, SHARE_MIN};

/// Share implied by this quarter's sales alone.
pub fn immediate_share(sold: u64, market_units: u64) -> f64 {
    let ratio = if market_units == 0 {
        0.0
    } else {
        sold as f64 / market_units as f64
    };
    (0.03 + ratio * 0.9).clamp(SHARE_MIN, SHARE_MAX)
}

/// Blend the prior share with this quarter's sales. A stronger brand keeps
/// more of the prior share. Returns the new share.
pub fn update_share(state: &mut CompanyState, sold: u64, market_units: u64) -> f64 {
    let immediate = immediate_share(sold, market_units);
    let loyalty = state.reputation / 200.0;
    let blended = state.market_share * (0.85 + loyalty) + immediate * (0.15 + (1.0 - loyalty) * 0.35);
    state.market_share = blended.clamp(SHARE_MIN, SHARE_MAX);
    state.market_share
}

/// Intrinsic value from annualised profit, before macro adjustment.
pub fn fundamentals(state: &CompanyState, quarterly_profit: Decimal) -> f64 {
    let profit_annual = to_f64(quarterly_profit) * 4.0;
    let multiple = 8.0 + state.reputation / 100.0 * 6.0 + state.os_maturity / 100.0 * 4.0;
    let scale = 1.0 + state.market_share * 1.5;
    let os_bonus = match state.os_mode {
        OsMode::Open => 1.0 + state.dev_ecosystem / 100.0 * 0.15,
        OsMode::License | OsMode::Closed => 1.0,
    };
    profit_annual.max(0.0) * multiple * scale * os_bonus
}

/// Minimum valuation backed by brand and share.
pub fn valuation_floor(state: &CompanyState) -> f64 {
    500_000.0 + state.reputation * 20_000.0 + state.market_share * 20_000_000.0
}

/// Recompute the valuation from fundamentals and macro.
pub fn update_valuation(state: &mut CompanyState, quarterly_profit: Decimal) -> Decimal {
    let computed = fundamentals(state, quarterly_profit);
    let value = valuation_floor(state).max(computed) * state.macro_factor;
    state.valuation = money(value).max(Decimal::ZERO);
    state.valuation
}

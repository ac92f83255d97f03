#![deny(warnings)]

//! Economic models for Phone Tycoon.
//!
//! Every formula used to resolve a quarter lives here as a pure function of the
//! company state, or as a single-concern mutator of it:
//! - market size and the one-shot "touch" disruption
//! - demand estimation (segment share, price elasticity, brand, OS, channel)
//! - production, defects and bill-of-materials cost
//! - cash flow, interest and automatic debt issuance
//! - reputation, market share, valuation and rival pressure
//! - OS maturity and developer ecosystem progression
//!
//! Randomness is injected through [`RandomSource`] so that outcomes are
//! reproducible.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

pub mod brand;
pub mod demand;
pub mod disruption;
pub mod finance;
pub mod macro_cycle;
pub mod market;
pub mod os;
pub mod production;
pub mod rivals;
pub mod rng;
pub mod tables;
pub mod valuation;

pub use brand::{update_reputation, ReputationInputs};
pub use demand::{
    demand_breakdown, estimate_demand, market_interest_level, product_attractiveness,
    DemandBreakdown, InterestLevel,
};
pub use disruption::advance_disruption;
pub use finance::{Ledger, Sales};
pub use macro_cycle::{advance_macro, MacroClimate, MacroShock};
pub use market::{market_units, total_market_units};
pub use os::advance_os;
pub use production::{current_unit_cost, defect_rate, unit_cost, ProductionRun, Purchase};
pub use rivals::update_rivals;
pub use rng::{FixedSource, RandomSource, ScriptedSource};
pub use valuation::{update_share, update_valuation};

/// Round a computed amount to whole currency units.
///
/// Non-finite input maps to zero.
pub fn money(x: f64) -> Decimal {
    if !x.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(x.round()).unwrap_or(Decimal::ZERO)
}

/// Lossy conversion used when a monetary amount enters a float formula.
pub fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Round a non-negative unit quantity, saturating at the `u64` bounds.
pub(crate) fn round_units(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    x.round().min(u64::MAX as f64) as u64
}

/// Diminishing-returns spend curve shared by marketing, OS R&D and the
/// disruption trigger: `log10(1 + spend / 20000)`.
pub(crate) fn spend_curve(spend: Decimal) -> f64 {
    (1.0 + to_f64(spend).max(0.0) / 20_000.0).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rounds_to_whole_units() {
        assert_eq!(money(12.5), Decimal::new(13, 0));
        assert_eq!(money(-3.4), Decimal::new(-3, 0));
        assert_eq!(money(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn units_never_negative() {
        assert_eq!(round_units(-4.0), 0);
        assert_eq!(round_units(f64::INFINITY), 0);
        assert_eq!(round_units(963.75), 964);
    }

    #[test]
    fn spend_curve_is_zero_without_spend() {
        assert_eq!(spend_curve(Decimal::ZERO), 0.0);
        assert!((spend_curve(Decimal::new(20_000, 0)) - 2f64.log10()).abs() < 1e-12);
        assert_eq!(spend_curve(Decimal::new(-500, 0)), 0.0);
    }
}

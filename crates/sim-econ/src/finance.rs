//! Cash flow of a quarter: operating costs, sales, royalties, warranty,
//! interest and automatic debt issuance.

use crate::production::warranty_cost;
use crate::tables::{channel, credit_limit, interest_rate};
use crate::{money, to_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{CompanyState, OsMode};

/// Royalty share of revenue paid to the OS vendor under a license.
pub const LICENSE_ROYALTY: f64 = 0.06;
/// Cushion borrowed on top of the cash shortfall.
pub const DEBT_CUSHION: f64 = 50_000.0;

/// Overhead for the quarter: base, per-unit capacity upkeep and OS team.
pub fn fixed_costs(state: &CompanyState) -> Decimal {
    let os_team = match state.os_mode {
        OsMode::License => 6_000.0,
        OsMode::Closed | OsMode::Open => 12_000.0,
    };
    money(25_000.0 + f64::from(state.capacity) * 6.0 + os_team)
}

/// Every cash movement of one quarter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub buy_cost: Decimal,
    pub fixed_costs: Decimal,
    pub rnd_spend: Decimal,
    pub marketing_spend: Decimal,
    pub revenue: Decimal,
    pub royalties: Decimal,
    pub warranty_cost: Decimal,
    pub interest: Decimal,
    pub debt_issued: Decimal,
}

impl Ledger {
    /// Net income of the quarter. Borrowed cash is not income.
    pub fn profit(&self) -> Decimal {
        self.revenue
            - self.buy_cost
            - self.fixed_costs
            - self.rnd_spend
            - self.marketing_spend
            - self.royalties
            - self.warranty_cost
            - self.interest
    }

    /// Total change in cash, including borrowed cash.
    pub fn net_cash_change(&self) -> Decimal {
        self.profit() + self.debt_issued
    }
}

/// Deduct fixed overhead plus R&D and marketing budgets from cash.
/// Returns `(fixed, rnd, marketing)`.
pub fn pay_operating_costs(state: &mut CompanyState) -> (Decimal, Decimal, Decimal) {
    let fixed = fixed_costs(state);
    let rnd = state.rnd_spend.max(Decimal::ZERO);
    let marketing = state.marketing_spend.max(Decimal::ZERO);
    state.cash -= fixed + rnd + marketing;
    (fixed, rnd, marketing)
}

/// Sales outcome of a quarter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sales {
    pub sold: u64,
    pub unsold: u64,
    pub revenue: Decimal,
    pub royalties: Decimal,
    pub warranty_cost: Decimal,
}

/// Sell good units against demand and book revenue, royalties and warranty.
pub fn resolve_sales(
    state: &mut CompanyState,
    good_units: u64,
    bad_units: u64,
    demand: u64,
    unit_cost: Decimal,
) -> Sales {
    let sold = good_units.min(demand);
    let revenue = money(sold as f64 * to_f64(state.price) * channel(state.channel).margin_factor);
    let royalties = match state.os_mode {
        OsMode::License => money(to_f64(revenue) * LICENSE_ROYALTY),
        OsMode::Closed | OsMode::Open => Decimal::ZERO,
    };
    let warranty = warranty_cost(bad_units, unit_cost);
    state.cash += revenue - royalties - warranty;
    Sales {
        sold,
        unsold: good_units - sold,
        revenue,
        royalties,
        warranty_cost: warranty,
    }
}

/// Charge the quarter's interest on outstanding debt.
pub fn accrue_interest(state: &mut CompanyState) -> Decimal {
    if state.debt <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let interest = money(to_f64(state.debt) * interest_rate(state.time.year));
    state.cash -= interest;
    interest
}

/// Borrow to cover a negative cash balance, up to the era's credit limit.
/// Returns the amount borrowed; zero when cash is not negative.
pub fn issue_debt_if_needed(state: &mut CompanyState) -> Decimal {
    if state.cash >= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let shortfall = to_f64(state.cash).abs() + DEBT_CUSHION;
    let borrowed = money(shortfall.min(credit_limit(state.time.year)));
    state.debt += borrowed;
    state.cash += borrowed;
    borrowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Channel, GameTime};

    #[test]
    fn fixed_costs_by_os_mode() {
        let mut s = CompanyState::default();
        assert_eq!(fixed_costs(&s), Decimal::new(37_000, 0));
        s.os_mode = OsMode::Open;
        assert_eq!(fixed_costs(&s), Decimal::new(43_000, 0));
    }

    #[test]
    fn operating_costs_leave_cash() {
        let mut s = CompanyState::default();
        let (fixed, rnd, mkt) = pay_operating_costs(&mut s);
        assert_eq!(fixed + rnd + mkt, Decimal::new(87_000, 0));
        assert_eq!(s.cash, Decimal::new(163_000, 0));
    }

    #[test]
    fn sales_capped_by_demand_and_license_royalties() {
        let mut s = CompanyState {
            cash: Decimal::ZERO,
            ..CompanyState::default()
        };
        let sales = resolve_sales(&mut s, 964, 36, 500, Decimal::new(280, 0));
        assert_eq!(sales.sold, 500);
        assert_eq!(sales.unsold, 464);
        // 500 * 399 * 0.88
        assert_eq!(sales.revenue, Decimal::new(175_560, 0));
        assert_eq!(sales.royalties, Decimal::new(10_534, 0));
        assert_eq!(sales.warranty_cost, Decimal::new(6_048, 0));
        assert_eq!(s.cash, Decimal::new(175_560 - 10_534 - 6_048, 0));
    }

    #[test]
    fn own_os_pays_no_royalties() {
        let mut s = CompanyState {
            os_mode: OsMode::Closed,
            channel: Channel::B2b,
            ..CompanyState::default()
        };
        let sales = resolve_sales(&mut s, 100, 0, 1_000, Decimal::new(280, 0));
        assert_eq!(sales.royalties, Decimal::ZERO);
        assert_eq!(sales.revenue, Decimal::new(37_506, 0));
    }

    #[test]
    fn interest_only_on_debt() {
        let mut s = CompanyState::default();
        assert_eq!(accrue_interest(&mut s), Decimal::ZERO);
        s.debt = Decimal::new(100_000, 0);
        s.time = GameTime::new(2010, 2);
        assert_eq!(accrue_interest(&mut s), Decimal::new(2_000, 0));
        assert_eq!(s.cash, Decimal::new(248_000, 0));
    }

    #[test]
    fn auto_debt_covers_shortfall_plus_cushion() {
        let mut s = CompanyState {
            cash: Decimal::new(-30_000, 0),
            ..CompanyState::default()
        };
        assert_eq!(issue_debt_if_needed(&mut s), Decimal::new(80_000, 0));
        assert_eq!(s.cash, Decimal::new(50_000, 0));
        assert_eq!(s.debt, Decimal::new(80_000, 0));
        assert_eq!(issue_debt_if_needed(&mut s), Decimal::ZERO);
    }

    #[test]
    fn auto_debt_respects_credit_limit() {
        let mut s = CompanyState {
            cash: Decimal::new(-900_000, 0),
            time: GameTime::new(2008, 1),
            ..CompanyState::default()
        };
        assert_eq!(issue_debt_if_needed(&mut s), Decimal::new(250_000, 0));
        assert_eq!(s.cash, Decimal::new(-650_000, 0));
    }

    #[test]
    fn ledger_profit_excludes_borrowing() {
        let l = Ledger {
            revenue: Decimal::new(1_000, 0),
            buy_cost: Decimal::new(300, 0),
            interest: Decimal::new(50, 0),
            debt_issued: Decimal::new(400, 0),
            ..Ledger::default()
        };
        assert_eq!(l.profit(), Decimal::new(650, 0));
        assert_eq!(l.net_cash_change(), Decimal::new(1_050, 0));
    }

    proptest! {
        #[test]
        fn debt_never_negative_and_only_when_short(cash in -2_000_000i64..2_000_000, debt in 0i64..5_000_000) {
            let mut s = CompanyState {
                cash: Decimal::new(cash, 0),
                debt: Decimal::new(debt, 0),
                ..CompanyState::default()
            };
            let issued = issue_debt_if_needed(&mut s);
            prop_assert!(issued >= Decimal::ZERO);
            prop_assert!(s.debt >= Decimal::new(debt, 0));
            if cash >= 0 {
                prop_assert_eq!(issued, Decimal::ZERO);
            } else {
                prop_assert!(issued > Decimal::ZERO);
            }
        }
    }
}

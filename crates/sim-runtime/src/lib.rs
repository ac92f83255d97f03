#![deny(warnings)]

//! Quarter orchestration for Phone Tycoon.
//!
//! [`advance_quarter`] is the single entry point that resolves a quarter: it
//! runs every economic step in a fixed order over an explicit state value and
//! an injected random source, then returns the report snapshot. [`Session`]
//! wraps it with a seeded RNG and an optional save store.

use persistence::{load_state, reset_state, save_state, SaveStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use sim_core::{CompanyState, Decision, ReportSnapshot, SimConfig};
use sim_econ::brand::update_reputation;
use sim_econ::finance::{accrue_interest, issue_debt_if_needed, pay_operating_costs, resolve_sales};
use sim_econ::production::{purchase_components, run_production};
use sim_econ::{
    advance_disruption, advance_macro, advance_os, current_unit_cost, estimate_demand,
    market_units, product_attractiveness, update_rivals, update_share, update_valuation, Ledger,
    MacroShock, RandomSource, ReputationInputs,
};
use tracing::{debug, info, warn};

/// Resolve one quarter in place and return its report.
///
/// Order: macro, disruption, OS progression, component purchase, operating
/// costs, production, demand, sales, interest, auto-debt, profit, share,
/// reputation, rivals, valuation, snapshot, clock. Each step observes the
/// state left by the previous ones.
pub fn advance_quarter<R: RandomSource + ?Sized>(
    state: &mut CompanyState,
    rng: &mut R,
) -> ReportSnapshot {
    let period = state.time;
    let cash_before = state.cash;
    let reputation_before = state.reputation;
    let share_before = state.market_share;

    let shock = advance_macro(state, rng);
    if shock != MacroShock::None {
        debug!(%period, ?shock, factor = state.macro_factor, "macro shock");
    }
    if advance_disruption(state, rng) {
        info!(%period, intensity = state.disruption.intensity, "touch revolution started");
    }
    advance_os(state);

    let mut ledger = Ledger::default();
    let unit_cost = current_unit_cost(state);
    let purchase = purchase_components(state, unit_cost);
    ledger.buy_cost = purchase.cost;
    let (fixed, rnd, marketing) = pay_operating_costs(state);
    ledger.fixed_costs = fixed;
    ledger.rnd_spend = rnd;
    ledger.marketing_spend = marketing;

    let run = run_production(state);
    debug!(
        producible = run.producible,
        good = run.good_units,
        bad = run.bad_units,
        defect_rate = run.defect_rate,
        "production"
    );

    let market = market_units(state);
    let demand = estimate_demand(state);
    let attractiveness = product_attractiveness(state);
    let sales = resolve_sales(state, run.good_units, run.bad_units, demand, unit_cost);
    ledger.revenue = sales.revenue;
    ledger.royalties = sales.royalties;
    ledger.warranty_cost = sales.warranty_cost;
    debug!(demand, sold = sales.sold, revenue = %sales.revenue, "sales");

    ledger.interest = accrue_interest(state);
    ledger.debt_issued = issue_debt_if_needed(state);
    if ledger.debt_issued > Decimal::ZERO {
        warn!(
            %period,
            borrowed = %ledger.debt_issued,
            debt = %state.debt,
            "cash shortfall covered by automatic debt"
        );
    }
    let profit = ledger.profit();

    let share_after = update_share(state, sales.sold, market);
    let reputation_delta = update_reputation(
        state,
        &ReputationInputs {
            sold: sales.sold,
            demand,
            defect_rate: run.defect_rate,
            profit,
        },
    );
    let rivals_power = update_rivals(state, share_before, share_after, rng);
    let valuation = update_valuation(state, profit);

    let report = ReportSnapshot {
        period,
        macro_factor: state.macro_factor,
        disruption_started: state.disruption.started,
        disruption_intensity: state.disruption.intensity,
        market_units: market,
        demand,
        attractiveness,
        defect_rate: run.defect_rate,
        unit_cost,
        buy_units: purchase.units,
        buy_cost: purchase.cost,
        producible: run.producible,
        good_units: run.good_units,
        bad_units: run.bad_units,
        sold: sales.sold,
        unsold_units: sales.unsold,
        revenue: ledger.revenue,
        royalties: ledger.royalties,
        warranty_cost: ledger.warranty_cost,
        fixed_costs: ledger.fixed_costs,
        rnd_spend: ledger.rnd_spend,
        marketing_spend: ledger.marketing_spend,
        interest: ledger.interest,
        debt_issued: ledger.debt_issued,
        profit,
        cash_before,
        cash_after: state.cash,
        debt_after: state.debt,
        reputation_before,
        reputation_after: state.reputation,
        reputation_delta,
        share_before,
        share_after,
        rivals_power,
        os_maturity: state.os_maturity,
        dev_ecosystem: state.dev_ecosystem,
        valuation,
    };
    state.last_report = Some(report.clone());
    state.time.advance();

    info!(
        %period,
        sold = report.sold,
        demand = report.demand,
        profit = %report.profit,
        cash = %report.cash_after,
        reputation = report.reputation_after,
        share = report.share_after,
        "quarter resolved"
    );
    report
}

/// Resolve `quarters` consecutive quarters, returning every report.
pub fn run_quarters_in_place<R: RandomSource + ?Sized>(
    state: &mut CompanyState,
    rng: &mut R,
    quarters: u32,
) -> Vec<ReportSnapshot> {
    (0..quarters).map(|_| advance_quarter(state, rng)).collect()
}

/// A running game: state, seeded RNG and an optional save store.
///
/// Every mutation is persisted immediately. A failed write is logged and kept
/// in [`Session::last_persist_error`]; the in-memory game carries on.
pub struct Session {
    state: CompanyState,
    rng: ChaCha8Rng,
    config: SimConfig,
    store: Option<Box<dyn SaveStore>>,
    last_persist_error: Option<String>,
}

impl Session {
    /// Fresh game from the default state, without persistence.
    pub fn new(config: SimConfig) -> Self {
        Self::with_state(CompanyState::default(), config)
    }

    pub fn with_state(state: CompanyState, config: SimConfig) -> Self {
        Self {
            state,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            store: None,
            last_persist_error: None,
        }
    }

    /// Resume the game saved in `store` under the configured key, or start
    /// fresh when there is none.
    pub fn open(config: SimConfig, store: Box<dyn SaveStore>) -> Self {
        let state = load_state(store.as_ref(), &config.state_key);
        info!(key = %config.state_key, period = %state.time, "session opened");
        let mut session = Self::with_state(state, config);
        session.store = Some(store);
        session
    }

    pub fn state(&self) -> &CompanyState {
        &self.state
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Apply the player's decisions ahead of the next resolution.
    pub fn apply(&mut self, decision: &Decision) {
        if decision.is_empty() {
            return;
        }
        decision.apply_to(&mut self.state);
        debug!(?decision, "decision applied");
        self.persist();
    }

    /// Resolve the current quarter.
    pub fn advance(&mut self) -> ReportSnapshot {
        let report = advance_quarter(&mut self.state, &mut self.rng);
        self.persist();
        report
    }

    pub fn run_quarters(&mut self, quarters: u32) -> Vec<ReportSnapshot> {
        (0..quarters).map(|_| self.advance()).collect()
    }

    /// Start over from the default state and the configured seed.
    pub fn reset(&mut self) {
        self.state = match self.store.as_mut() {
            Some(store) => match reset_state(store.as_mut(), &self.config.state_key) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "could not discard save");
                    self.last_persist_error = Some(e.to_string());
                    CompanyState::default()
                }
            },
            None => CompanyState::default(),
        };
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
        info!("session reset to defaults");
    }

    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match save_state(store.as_mut(), &self.config.state_key, &self.state) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(error = %e, "failed to persist state; continuing in memory");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{MemoryStore, PersistError};
    use proptest::prelude::*;
    use sim_core::{validate_state, Disruption, GameTime, OsMode, Tier, SHARE_MAX, SHARE_MIN};
    use sim_econ::{FixedSource, ScriptedSource};

    #[test]
    fn default_quarter_with_midpoint_draws() {
        let mut s = CompanyState::default();
        let r = advance_quarter(&mut s, &mut FixedSource(0.5));

        assert_eq!(s.time, GameTime::new(2000, 2));
        assert_eq!(r.period, GameTime::new(2000, 1));
        assert!((r.macro_factor - 1.0).abs() < 1e-12);
        assert!(!r.disruption_started);
        assert_eq!(r.producible, 1000);
        assert!((r.defect_rate - 0.03625).abs() < 1e-12);
        assert_eq!(r.good_units, 964);
        assert_eq!(r.bad_units, 36);
        assert!(r.demand > r.good_units);
        assert_eq!(r.sold, 964);
        assert_eq!(r.unit_cost, Decimal::new(280, 0));
        assert_eq!(r.revenue, Decimal::new(338_480, 0));
        assert_eq!(r.royalties, Decimal::new(20_309, 0));
        assert_eq!(r.warranty_cost, Decimal::new(6_048, 0));
        assert_eq!(r.profit, Decimal::new(-54_877, 0));
        assert_eq!(s.cash, Decimal::new(195_123, 0));
        assert_eq!(r.debt_issued, Decimal::ZERO);
        assert_eq!(s.stock, 1200);
        assert_eq!(s.reputation, 33.0);
        assert!((s.rivals_power - 0.96).abs() < 1e-12);
        assert_eq!(s.os_maturity, 11.0);
        assert_eq!(s.last_report.as_ref(), Some(&r));
    }

    #[test]
    fn cash_is_conserved() {
        let mut s = CompanyState {
            cash: Decimal::new(-400_000, 0),
            debt: Decimal::new(300_000, 0),
            ..CompanyState::default()
        };
        let r = advance_quarter(&mut s, &mut FixedSource(0.5));
        let expected = r.cash_before - r.buy_cost - r.fixed_costs - r.rnd_spend
            - r.marketing_spend
            + r.revenue
            - r.royalties
            - r.warranty_cost
            - r.interest
            + r.debt_issued;
        assert_eq!(r.cash_after, expected);
        assert_eq!(r.interest, Decimal::new(4_500, 0));
        assert!(r.debt_issued > Decimal::ZERO);
        assert_eq!(s.debt, Decimal::new(300_000, 0) + r.debt_issued);
    }

    #[test]
    fn license_never_exceeds_forty() {
        let mut s = CompanyState {
            rnd_spend: Decimal::new(500_000, 0),
            ..CompanyState::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..10 {
            advance_quarter(&mut s, &mut rng);
            assert!(s.os_maturity <= 40.0);
        }
        assert_eq!(s.os_mode, OsMode::License);
    }

    #[test]
    fn disruption_forced_in_2010() {
        let mut s = CompanyState {
            time: GameTime::new(2010, 1),
            ..CompanyState::default()
        };
        let r = advance_quarter(&mut s, &mut FixedSource(0.99));
        assert!(r.disruption_started);
        assert_eq!(s.disruption.intensity, 0.25);
    }

    #[test]
    fn random_draws_follow_fixed_order() {
        // drift, shock roll, rival noise; no disruption draw before 2005
        let mut s = CompanyState::default();
        let mut src = ScriptedSource::new(vec![0.5]);
        advance_quarter(&mut s, &mut src);
        assert_eq!(src.consumed(), 3);

        let mut s = CompanyState {
            time: GameTime::new(2006, 1),
            ..CompanyState::default()
        };
        let mut src = ScriptedSource::new(vec![0.5]);
        advance_quarter(&mut s, &mut src);
        assert_eq!(src.consumed(), 4);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = Session::new(SimConfig::default());
        let mut b = Session::new(SimConfig::default());
        assert_eq!(a.run_quarters(12), b.run_quarters(12));
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state().time, GameTime::new(2003, 1));
    }

    #[test]
    fn session_persists_every_mutation() {
        let mut session = Session::open(SimConfig::default(), Box::new(MemoryStore::new()));
        session.apply(&Decision {
            tier: Some(Tier::Premium),
            price: Some(Decimal::new(799, 0)),
            ..Decision::default()
        });
        session.advance();
        assert!(session.last_persist_error().is_none());
        let store = session.store.as_ref().map(|s| s.read(sim_core::DEFAULT_STATE_KEY));
        let blob = store.and_then(|r| r.ok()).flatten().unwrap();
        let saved = persistence::decode_state(&blob).unwrap();
        assert_eq!(&saved, session.state());
        assert_eq!(saved.tier, Tier::Premium);
    }

    struct BrokenStore;

    impl SaveStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, PersistError> {
            Ok(None)
        }
        fn write(&mut self, _key: &str, _blob: &str) -> Result<(), PersistError> {
            Err(PersistError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
        fn remove(&mut self, _key: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    #[test]
    fn persist_failure_is_not_fatal() {
        let mut session = Session::open(SimConfig::default(), Box::new(BrokenStore));
        let r = session.advance();
        assert_eq!(r.period, GameTime::new(2000, 1));
        assert_eq!(session.state().time, GameTime::new(2000, 2));
        assert!(session.last_persist_error().unwrap().contains("disk full"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut session = Session::open(SimConfig::default(), Box::new(MemoryStore::new()));
        let first = session.run_quarters(3);
        session.reset();
        assert_eq!(session.state(), &CompanyState::default());
        assert_eq!(session.run_quarters(3), first);
    }

    fn arb_state() -> impl Strategy<Value = CompanyState> {
        (
            (2000i32..2030, 1u8..=4, -2_000_000i64..2_000_000, 0i64..2_000_000),
            (0.0f64..=100.0, SHARE_MIN..=SHARE_MAX, 0.80f64..=1.25, 0.85f64..=1.25),
            (0usize..3, 0usize..3, 0usize..3, 0.0f64..=100.0, 0.0f64..=100.0),
            (1i64..3_000, 0u8..=100, 0u8..=100, 0i64..500_000, 0i64..500_000),
            (1u32..50_000, 0u64..100_000, 0u64..50_000, any::<bool>(), 0.0f64..=1.0),
        )
            .prop_map(
                |(
                    (year, quarter, cash, debt),
                    (reputation, market_share, macro_factor, rivals_power),
                    (tier, os, ch, osm, eco),
                    (price, quality, process_quality, rnd, mkt),
                    (capacity, stock, buy_units, started, intensity),
                )| {
                    let mut s = CompanyState {
                        time: GameTime::new(year, quarter),
                        cash: Decimal::new(cash, 0),
                        debt: Decimal::new(debt, 0),
                        reputation,
                        market_share,
                        macro_factor,
                        rivals_power,
                        tier: Tier::ALL[tier],
                        os_mode: OsMode::ALL[os],
                        channel: sim_core::Channel::ALL[ch],
                        os_maturity: osm,
                        dev_ecosystem: eco,
                        price: Decimal::new(price, 0),
                        quality,
                        process_quality,
                        rnd_spend: Decimal::new(rnd, 0),
                        marketing_spend: Decimal::new(mkt, 0),
                        capacity,
                        stock,
                        buy_units,
                        disruption: Disruption { started, intensity },
                        ..CompanyState::default()
                    };
                    s.sanitize();
                    s
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invariants_hold_after_any_quarters(start in arb_state(), seed in any::<u64>(), n in 1u32..24) {
            let mut s = start;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..n {
                let debt_before = s.debt;
                let r = advance_quarter(&mut s, &mut rng);
                prop_assert!(validate_state(&s).is_ok(), "{:?}", validate_state(&s));
                prop_assert!(s.debt >= debt_before);
                prop_assert!(r.good_units + r.bad_units == r.producible);
                prop_assert!(r.sold <= r.demand && r.sold <= r.good_units);
                if r.debt_issued > Decimal::ZERO {
                    prop_assert!(r.cash_after - r.debt_issued < Decimal::ZERO);
                }
                let expected = r.cash_before - r.buy_cost - r.fixed_costs - r.rnd_spend
                    - r.marketing_spend + r.revenue - r.royalties - r.warranty_cost
                    - r.interest + r.debt_issued;
                prop_assert_eq!(r.cash_after, expected);
            }
        }
    }
}

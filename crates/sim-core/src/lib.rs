#![deny(warnings)]

//! Core domain models and invariants for Phone Tycoon.
//!
//! This crate defines the serializable company state that is resolved once per
//! simulated quarter, the report snapshot produced by each resolution, the
//! player decision record, and validation helpers guaranteeing the state
//! invariants.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// First simulated year.
pub const FIRST_YEAR: i32 = 2000;
/// Lower bound of market share (fraction).
pub const SHARE_MIN: f64 = 0.01;
/// Upper bound of market share (fraction).
pub const SHARE_MAX: f64 = 0.65;
/// Lower bound of the macro multiplier.
pub const MACRO_MIN: f64 = 0.80;
/// Upper bound of the macro multiplier.
pub const MACRO_MAX: f64 = 1.25;
/// Lower bound of rival pressure.
pub const RIVALS_MIN: f64 = 0.85;
/// Upper bound of rival pressure.
pub const RIVALS_MAX: f64 = 1.25;
/// OS maturity ceiling while the OS is licensed from a vendor.
pub const LICENSE_OS_CAP: f64 = 40.0;
/// Save key of the company state blob.
pub const DEFAULT_STATE_KEY: &str = "st_state_v1";

/// Simulated calendar position: a year and a quarter in `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameTime {
    pub year: i32,
    pub quarter: u8,
}

impl Default for GameTime {
    fn default() -> Self {
        Self {
            year: FIRST_YEAR,
            quarter: 1,
        }
    }
}

impl GameTime {
    pub fn new(year: i32, quarter: u8) -> Self {
        Self { year, quarter }
    }

    /// The following quarter; Q4 rolls over into Q1 of the next year.
    pub fn next(self) -> Self {
        if self.quarter >= 4 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.quarter + 1)
        }
    }

    /// Advance the clock by one quarter in place.
    pub fn advance(&mut self) {
        *self = self.next();
    }

    /// First calendar day of the quarter.
    pub fn start_date(self) -> Option<NaiveDate> {
        let month = u32::from(self.quarter.clamp(1, 4) - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q{}", self.year, self.quarter)
    }
}

/// Product market segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Budget,
    #[default]
    Mainstream,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Budget, Tier::Mainstream, Tier::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Budget => "budget",
            Tier::Mainstream => "mainstream",
            Tier::Premium => "premium",
        }
    }
}

/// Operating-system strategy. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsMode {
    /// OS licensed from a third-party vendor; pays royalties, capped maturity.
    #[default]
    License,
    /// Proprietary in-house OS.
    Closed,
    /// In-house OS opened to outside developers.
    Open,
}

impl OsMode {
    pub const ALL: [OsMode; 3] = [OsMode::License, OsMode::Closed, OsMode::Open];

    pub fn as_str(self) -> &'static str {
        match self {
            OsMode::License => "license",
            OsMode::Closed => "closed",
            OsMode::Open => "open",
        }
    }
}

/// Distribution channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    B2b,
    #[default]
    Retail,
    Carrier,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::B2b, Channel::Retail, Channel::Carrier];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::B2b => "b2b",
            Channel::Retail => "retail",
            Channel::Carrier => "carrier",
        }
    }
}

macro_rules! impl_from_str {
    ($ty:ident) => {
        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase();
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| ValidationError::UnknownVariant(s.to_string()))
            }
        }
    };
}

impl_from_str!(Tier);
impl_from_str!(OsMode);
impl_from_str!(Channel);

/// One-shot "touch revolution" market disruption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disruption {
    pub started: bool,
    /// Ramp in [0,1]; only grows once started.
    pub intensity: f64,
}

/// Everything computed while resolving one quarter, kept for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportSnapshot {
    /// Quarter that was resolved.
    pub period: GameTime,
    pub macro_factor: f64,
    pub disruption_started: bool,
    pub disruption_intensity: f64,
    /// Total addressable units this quarter.
    pub market_units: u64,
    pub demand: u64,
    pub attractiveness: u8,
    pub defect_rate: f64,
    pub unit_cost: Decimal,
    pub buy_units: u64,
    pub buy_cost: Decimal,
    pub producible: u64,
    pub good_units: u64,
    pub bad_units: u64,
    pub sold: u64,
    /// Good units produced but not sold; they are not carried over.
    pub unsold_units: u64,
    pub revenue: Decimal,
    pub royalties: Decimal,
    pub warranty_cost: Decimal,
    pub fixed_costs: Decimal,
    pub rnd_spend: Decimal,
    pub marketing_spend: Decimal,
    pub interest: Decimal,
    pub debt_issued: Decimal,
    pub profit: Decimal,
    pub cash_before: Decimal,
    pub cash_after: Decimal,
    pub debt_after: Decimal,
    pub reputation_before: f64,
    pub reputation_after: f64,
    pub reputation_delta: f64,
    pub share_before: f64,
    pub share_after: f64,
    pub rivals_power: f64,
    pub os_maturity: f64,
    pub dev_ecosystem: f64,
    pub valuation: Decimal,
}

/// The single mutable company record owned by the quarter orchestrator.
///
/// Deserialization is forward compatible: any field missing from a stored
/// record falls back to [`CompanyState::default`], unknown fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyState {
    pub time: GameTime,
    /// May go negative transiently before auto-debt issuance.
    pub cash: Decimal,
    pub debt: Decimal,
    /// Brand score in [0,100].
    pub reputation: f64,
    /// Fraction in [0.01, 0.65].
    pub market_share: f64,
    pub valuation: Decimal,
    #[serde(rename = "macro")]
    pub macro_factor: f64,
    pub os_mode: OsMode,
    pub os_maturity: f64,
    pub dev_ecosystem: f64,
    pub tier: Tier,
    pub price: Decimal,
    /// Product performance, 0..=100.
    pub quality: u8,
    pub rnd_spend: Decimal,
    pub marketing_spend: Decimal,
    pub channel: Channel,
    /// Max units produced per quarter.
    pub capacity: u32,
    /// Manufacturing process quality, 0..=100.
    pub process_quality: u8,
    /// Component inventory carried across quarters.
    pub stock: u64,
    /// Components purchased each quarter (standing order).
    pub buy_units: u64,
    pub rivals_power: f64,
    pub disruption: Disruption,
    pub last_report: Option<ReportSnapshot>,
}

impl Default for CompanyState {
    fn default() -> Self {
        Self {
            time: GameTime::default(),
            cash: Decimal::new(250_000, 0),
            debt: Decimal::ZERO,
            reputation: 35.0,
            market_share: 0.08,
            valuation: Decimal::new(2_000_000, 0),
            macro_factor: 1.0,
            os_mode: OsMode::License,
            os_maturity: 10.0,
            dev_ecosystem: 10.0,
            tier: Tier::Mainstream,
            price: Decimal::new(399, 0),
            quality: 55,
            rnd_spend: Decimal::new(30_000, 0),
            marketing_spend: Decimal::new(20_000, 0),
            channel: Channel::Retail,
            capacity: 1000,
            process_quality: 45,
            stock: 1200,
            buy_units: 1000,
            rivals_power: 1.0,
            disruption: Disruption::default(),
            last_report: None,
        }
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

impl CompanyState {
    /// Upper bound of OS maturity under the current strategy.
    pub fn os_maturity_cap(&self) -> f64 {
        match self.os_mode {
            OsMode::License => LICENSE_OS_CAP,
            OsMode::Closed | OsMode::Open => 100.0,
        }
    }

    /// Coerce every field into its documented range. Non-finite floats fall
    /// back to the default value of the field.
    pub fn sanitize(&mut self) {
        let d = CompanyState::default();
        self.time.year = self.time.year.max(FIRST_YEAR);
        self.time.quarter = self.time.quarter.clamp(1, 4);
        self.debt = self.debt.max(Decimal::ZERO);
        self.valuation = self.valuation.max(Decimal::ZERO);
        self.price = self.price.max(Decimal::ONE);
        self.rnd_spend = self.rnd_spend.max(Decimal::ZERO);
        self.marketing_spend = self.marketing_spend.max(Decimal::ZERO);
        self.quality = self.quality.min(100);
        self.process_quality = self.process_quality.min(100);
        self.capacity = self.capacity.max(1);

        self.reputation = finite_or(self.reputation, d.reputation).clamp(0.0, 100.0);
        self.market_share = finite_or(self.market_share, d.market_share).clamp(SHARE_MIN, SHARE_MAX);
        self.macro_factor = finite_or(self.macro_factor, d.macro_factor).clamp(MACRO_MIN, MACRO_MAX);
        self.os_maturity =
            finite_or(self.os_maturity, d.os_maturity).clamp(0.0, self.os_maturity_cap());
        self.dev_ecosystem = finite_or(self.dev_ecosystem, d.dev_ecosystem).clamp(0.0, 100.0);
        self.rivals_power = finite_or(self.rivals_power, d.rivals_power).clamp(RIVALS_MIN, RIVALS_MAX);
        self.disruption.intensity = finite_or(self.disruption.intensity, 0.0).clamp(0.0, 1.0);
        if !self.disruption.started {
            self.disruption.intensity = 0.0;
        }
    }
}

/// A set of player decisions applied to the state before a quarter is resolved.
/// Absent fields leave the current value untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Decision {
    pub tier: Option<Tier>,
    pub price: Option<Decimal>,
    pub quality: Option<u8>,
    pub rnd_spend: Option<Decimal>,
    pub os_mode: Option<OsMode>,
    pub capacity: Option<u32>,
    pub process_quality: Option<u8>,
    pub buy_units: Option<u64>,
    pub marketing_spend: Option<Decimal>,
    pub channel: Option<Channel>,
}

impl Decision {
    pub fn is_empty(&self) -> bool {
        *self == Decision::default()
    }

    /// Write each present field onto `state`, coercing out-of-range values to
    /// the nearest bound.
    pub fn apply_to(&self, state: &mut CompanyState) {
        if let Some(tier) = self.tier {
            state.tier = tier;
        }
        if let Some(price) = self.price {
            state.price = price.round().max(Decimal::ONE);
        }
        if let Some(quality) = self.quality {
            state.quality = quality.min(100);
        }
        if let Some(rnd) = self.rnd_spend {
            state.rnd_spend = rnd.round().max(Decimal::ZERO);
        }
        if let Some(mode) = self.os_mode {
            state.os_mode = mode;
            state.os_maturity = state.os_maturity.min(state.os_maturity_cap());
        }
        if let Some(capacity) = self.capacity {
            state.capacity = capacity.max(1);
        }
        if let Some(pq) = self.process_quality {
            state.process_quality = pq.min(100);
        }
        if let Some(buy) = self.buy_units {
            state.buy_units = buy;
        }
        if let Some(mkt) = self.marketing_spend {
            state.marketing_spend = mkt.round().max(Decimal::ZERO);
        }
        if let Some(channel) = self.channel {
            state.channel = channel;
        }
    }
}

/// Parse a leading integer the way a lenient form field would: surrounding
/// junk is ignored and anything unparseable becomes 0.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|v| sign * v).unwrap_or(0)
}

/// Non-negative count; negatives become 0.
pub fn coerce_count(raw: &str) -> u64 {
    u64::try_from(coerce_int(raw).max(0)).unwrap_or(0)
}

/// Percentage clamped into `0..=100`.
pub fn coerce_percent(raw: &str) -> u8 {
    u8::try_from(coerce_int(raw).clamp(0, 100)).unwrap_or(0)
}

/// Whole-currency amount; negatives become 0.
pub fn coerce_money(raw: &str) -> Decimal {
    Decimal::from(coerce_int(raw).max(0))
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the deterministic RNG.
    pub rng_seed: u64,
    /// Directory holding save blobs.
    pub save_dir: PathBuf,
    /// Key of the company state blob.
    pub state_key: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            save_dir: PathBuf::from("./saves"),
            state_key: DEFAULT_STATE_KEY.to_string(),
        }
    }
}

/// Validation errors for state invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Year before the first simulated year.
    #[error("year {0} is before 2000")]
    YearOutOfRange(i32),
    /// Quarter outside 1..=4.
    #[error("quarter {0} is outside 1..=4")]
    QuarterOutOfRange(u8),
    /// Bounded float outside its range or non-finite.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Percentage above 100.
    #[error("{field} = {value} exceeds 100")]
    PercentOutOfRange { field: &'static str, value: u8 },
    /// Money field that must be non-negative.
    #[error("negative monetary value in {0}")]
    NegativeMoney(&'static str),
    /// Price must be strictly positive.
    #[error("price must be > 0")]
    NonPositivePrice,
    /// Capacity must be strictly positive.
    #[error("capacity must be > 0")]
    ZeroCapacity,
    /// Unrecognised enum label.
    #[error("unknown option: {0}")]
    UnknownVariant(String),
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Validate every invariant of a company state.
pub fn validate_state(s: &CompanyState) -> Result<(), ValidationError> {
    if s.time.year < FIRST_YEAR {
        return Err(ValidationError::YearOutOfRange(s.time.year));
    }
    if !(1..=4).contains(&s.time.quarter) {
        return Err(ValidationError::QuarterOutOfRange(s.time.quarter));
    }
    if s.debt < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("debt"));
    }
    if s.valuation < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("valuation"));
    }
    if s.rnd_spend < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("rndSpend"));
    }
    if s.marketing_spend < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("marketingSpend"));
    }
    if s.price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice);
    }
    if s.capacity == 0 {
        return Err(ValidationError::ZeroCapacity);
    }
    if s.quality > 100 {
        return Err(ValidationError::PercentOutOfRange {
            field: "quality",
            value: s.quality,
        });
    }
    if s.process_quality > 100 {
        return Err(ValidationError::PercentOutOfRange {
            field: "processQuality",
            value: s.process_quality,
        });
    }
    check_range("reputation", s.reputation, 0.0, 100.0)?;
    check_range("marketShare", s.market_share, SHARE_MIN, SHARE_MAX)?;
    check_range("macro", s.macro_factor, MACRO_MIN, MACRO_MAX)?;
    check_range("osMaturity", s.os_maturity, 0.0, s.os_maturity_cap())?;
    check_range("devEcosystem", s.dev_ecosystem, 0.0, 100.0)?;
    check_range("rivalsPower", s.rivals_power, RIVALS_MIN, RIVALS_MAX)?;
    check_range("disruption.intensity", s.disruption.intensity, 0.0, 1.0)?;
    Ok(())
}

//! Slowly drifting macro-economic multiplier with rare shocks.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use sim_core::CompanyState;

/// Half-width of the per-quarter drift.
pub const DRIFT: f64 = 0.015;
/// Probability of each shock tail.
pub const SHOCK_PROBABILITY: f64 = 0.015;
/// Size of a boom or bust shock.
pub const SHOCK: f64 = 0.08;

/// Shock applied during a macro step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroShock {
    None,
    Boom,
    Bust,
}

/// Advance the macro multiplier by one quarter.
///
/// Drift is clamped to [0.90, 1.15]; a boom may lift it up to 1.25 and a bust
/// may drop it down to 0.80. Drift and shock are drawn independently.
pub fn advance_macro<R: RandomSource + ?Sized>(state: &mut CompanyState, rng: &mut R) -> MacroShock {
    let drift = rng.uniform_in(-DRIFT, DRIFT);
    let mut m = (state.macro_factor + drift).clamp(0.90, 1.15);

    let roll = rng.next_unit();
    let shock = if roll < SHOCK_PROBABILITY {
        m = (m + SHOCK).clamp(0.90, 1.25);
        MacroShock::Boom
    } else if roll > 1.0 - SHOCK_PROBABILITY {
        m = (m - SHOCK).clamp(0.80, 1.15);
        MacroShock::Bust
    } else {
        MacroShock::None
    };
    state.macro_factor = m;
    shock
}

/// Display label for the economic climate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroClimate {
    Boom,
    Normal,
    Downturn,
    Crash,
}

impl MacroClimate {
    pub fn classify(macro_factor: f64) -> Self {
        if macro_factor >= 1.06 {
            MacroClimate::Boom
        } else if macro_factor <= 0.88 {
            MacroClimate::Crash
        } else if macro_factor <= 0.96 {
            MacroClimate::Downturn
        } else {
            MacroClimate::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MacroClimate::Boom => "boom",
            MacroClimate::Normal => "normal",
            MacroClimate::Downturn => "downturn",
            MacroClimate::Crash => "crash",
        }
    }
}

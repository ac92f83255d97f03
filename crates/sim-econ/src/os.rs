//! OS maturity and developer ecosystem progression.
//!
//! A licensed OS creeps forward on the vendor's schedule and is capped; an
//! in-house OS grows with R&D spend, faster when opened to developers.

use crate::spend_curve;
use sim_core::{CompanyState, OsMode, LICENSE_OS_CAP};

/// Developer ecosystem ceiling on a vendor-controlled platform.
pub const LICENSE_ECOSYSTEM_CAP: f64 = 30.0;

/// Maturity points gained this quarter from R&D under an in-house OS.
pub fn maturity_gain(state: &CompanyState) -> f64 {
    let weight = match state.os_mode {
        OsMode::Open => 2.2,
        OsMode::Closed => 1.8,
        OsMode::License => 0.0,
    };
    spend_curve(state.rnd_spend) * weight
}

/// Advance OS maturity and ecosystem by one quarter.
pub fn advance_os(state: &mut CompanyState) {
    match state.os_mode {
        OsMode::License => {
            state.os_maturity = (state.os_maturity + 1.0).clamp(10.0, LICENSE_OS_CAP);
            state.dev_ecosystem = (state.dev_ecosystem + 1.0).clamp(5.0, LICENSE_ECOSYSTEM_CAP);
        }
        OsMode::Closed | OsMode::Open => {
            let pull = if state.os_mode == OsMode::Open { 1.3 } else { 0.8 };
            state.os_maturity = (state.os_maturity + maturity_gain(state)).clamp(0.0, 100.0);
            let eco_gain =
                (state.os_maturity / 100.0) * 1.2 * pull + (state.reputation / 100.0) * 0.6;
            state.dev_ecosystem = (state.dev_ecosystem + eco_gain).clamp(0.0, 100.0);
        }
    }
}

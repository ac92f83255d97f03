//! Static per-tier, per-channel and per-era parameters.

use sim_core::{Channel, Tier};

/// Demand and cost parameters of a product tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentParams {
    /// Fraction of the total market addressed by the tier.
    pub base_share: f64,
    /// Price elasticity magnitude before the brand dampening.
    pub elasticity: f64,
    /// Reference ("ideal") price for the tier.
    pub price_ref: f64,
    /// Weight of product performance in demand.
    pub perf_weight: f64,
    /// Bill-of-materials base cost per unit.
    pub base_bom: f64,
}

pub fn segment(tier: Tier) -> SegmentParams {
    match tier {
        Tier::Budget => SegmentParams {
            base_share: 0.45,
            elasticity: 1.60,
            price_ref: 199.0,
            perf_weight: 0.20,
            base_bom: 120.0,
        },
        Tier::Mainstream => SegmentParams {
            base_share: 0.35,
            elasticity: 1.25,
            price_ref: 399.0,
            perf_weight: 0.30,
            base_bom: 190.0,
        },
        Tier::Premium => SegmentParams {
            base_share: 0.20,
            elasticity: 0.90,
            price_ref: 799.0,
            perf_weight: 0.45,
            base_bom: 330.0,
        },
    }
}

/// Price the market expects for the tier.
pub fn ideal_price(tier: Tier) -> f64 {
    segment(tier).price_ref
}

/// Demand reach and revenue retention of a distribution channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelParams {
    pub demand_factor: f64,
    /// Share of the sticker price the company keeps.
    pub margin_factor: f64,
}

pub fn channel(ch: Channel) -> ChannelParams {
    match ch {
        Channel::B2b => ChannelParams {
            demand_factor: 0.80,
            margin_factor: 0.94,
        },
        Channel::Retail => ChannelParams {
            demand_factor: 1.00,
            margin_factor: 0.88,
        },
        Channel::Carrier => ChannelParams {
            demand_factor: 1.18,
            margin_factor: 0.80,
        },
    }
}

/// Component cost multiplier by era.
pub fn era_cost_multiplier(year: i32) -> f64 {
    if year < 2007 {
        1.10
    } else if year < 2013 {
        1.05
    } else if year < 2021 {
        1.00
    } else {
        1.03
    }
}

/// Quarterly interest rate on outstanding debt.
pub fn interest_rate(year: i32) -> f64 {
    if year < 2007 {
        0.015
    } else if year < 2013 {
        0.02
    } else {
        0.025
    }
}

/// Maximum automatic borrowing in a single quarter.
pub fn credit_limit(year: i32) -> f64 {
    if year < 2007 {
        400_000.0
    } else {
        250_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideal_prices_match_tiers() {
        assert_eq!(ideal_price(Tier::Budget), 199.0);
        assert_eq!(ideal_price(Tier::Mainstream), 399.0);
        assert_eq!(ideal_price(Tier::Premium), 799.0);
    }

    #[test]
    fn segment_shares_cover_the_market() {
        let total: f64 = Tier::ALL.iter().map(|t| segment(*t).base_share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn carrier_reaches_more_but_keeps_less() {
        let retail = channel(Channel::Retail);
        let carrier = channel(Channel::Carrier);
        assert!(carrier.demand_factor > retail.demand_factor);
        assert!(carrier.margin_factor < retail.margin_factor);
        assert_eq!(channel(Channel::B2b).demand_factor, 0.80);
    }

    #[test]
    fn era_boundaries() {
        assert_eq!(era_cost_multiplier(2006), 1.10);
        assert_eq!(era_cost_multiplier(2007), 1.05);
        assert_eq!(era_cost_multiplier(2013), 1.00);
        assert_eq!(era_cost_multiplier(2021), 1.03);
        assert_eq!(interest_rate(2006), 0.015);
        assert_eq!(interest_rate(2012), 0.02);
        assert_eq!(interest_rate(2013), 0.025);
        assert_eq!(credit_limit(2006), 400_000.0);
        assert_eq!(credit_limit(2007), 250_000.0);
    }
}

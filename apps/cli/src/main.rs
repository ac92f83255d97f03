#![deny(warnings)]

//! Headless CLI: resume the saved company, apply decisions, resolve quarters
//! and print their reports.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use persistence::FileStore;
use rust_decimal::Decimal;
use serde::Deserialize;
use sim_core::{
    coerce_count, coerce_int, coerce_money, coerce_percent, CompanyState, Decision,
    ReportSnapshot, SimConfig,
};
use sim_econ::{market_interest_level, MacroClimate};
use sim_runtime::Session;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Optional YAML file passed with `--config`. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(flatten)]
    sim: SimConfig,
    quarters: Option<u32>,
    decision: Decision,
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    quarters: Option<u32>,
    seed: Option<u64>,
    save_dir: Option<PathBuf>,
    key: Option<String>,
    reset: bool,
    help: bool,
    decision: Decision,
}

const USAGE: &str = "usage: phone-tycoon [--config FILE] [--quarters N] [--seed N] \
[--save-dir DIR] [--key KEY] [--reset] [--tier T] [--price N] [--quality N] [--rnd N] \
[--os MODE] [--capacity N] [--process N] [--buy N] [--marketing N] [--channel C]";

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        if arg == "--reset" {
            out.reset = true;
            continue;
        }
        if arg == "--help" || arg == "-h" {
            out.help = true;
            return Ok(out);
        }
        let value = it
            .next()
            .with_context(|| format!("missing value for {arg}"))?;
        let d = &mut out.decision;
        match arg.as_str() {
            "--config" => out.config = Some(PathBuf::from(value)),
            "--quarters" => {
                out.quarters = Some(u32::try_from(coerce_count(&value)).unwrap_or(u32::MAX))
            }
            "--seed" => out.seed = Some(coerce_count(&value)),
            "--save-dir" => out.save_dir = Some(PathBuf::from(value)),
            "--key" => out.key = Some(value),
            "--tier" => d.tier = Some(value.parse()?),
            "--os" => d.os_mode = Some(value.parse()?),
            "--channel" => d.channel = Some(value.parse()?),
            "--price" => d.price = Some(Decimal::from(coerce_int(&value))),
            "--quality" => d.quality = Some(coerce_percent(&value)),
            "--process" => d.process_quality = Some(coerce_percent(&value)),
            "--rnd" => d.rnd_spend = Some(coerce_money(&value)),
            "--marketing" => d.marketing_spend = Some(coerce_money(&value)),
            "--capacity" => {
                d.capacity = Some(u32::try_from(coerce_count(&value)).unwrap_or(u32::MAX))
            }
            "--buy" => d.buy_units = Some(coerce_count(&value)),
            other => bail!("unknown flag {other}\n{USAGE}"),
        }
    }
    Ok(out)
}

fn load_file_config(path: Option<&PathBuf>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Flag values win over the file; unset decision flags keep the file's.
fn merge_decisions(file: Decision, flags: Decision) -> Decision {
    Decision {
        tier: flags.tier.or(file.tier),
        price: flags.price.or(file.price),
        quality: flags.quality.or(file.quality),
        rnd_spend: flags.rnd_spend.or(file.rnd_spend),
        os_mode: flags.os_mode.or(file.os_mode),
        capacity: flags.capacity.or(file.capacity),
        process_quality: flags.process_quality.or(file.process_quality),
        buy_units: flags.buy_units.or(file.buy_units),
        marketing_spend: flags.marketing_spend.or(file.marketing_spend),
        channel: flags.channel.or(file.channel),
    }
}

fn render_report(r: &ReportSnapshot) -> String {
    let disruption = if r.disruption_started {
        format!("touch wave {:.0}%", r.disruption_intensity * 100.0)
    } else {
        "no disruption".to_string()
    };
    let mut out = format!(
        "== {} | macro {:.2} ({}) | {} | market {} units\n",
        r.period,
        r.macro_factor,
        MacroClimate::classify(r.macro_factor).label(),
        disruption,
        r.market_units
    );
    out += &format!(
        "   build  | bought {} @ {} = {} | made {} ({} good, {} bad, defects {:.1}%)\n",
        r.buy_units,
        r.unit_cost,
        r.buy_cost,
        r.producible,
        r.good_units,
        r.bad_units,
        r.defect_rate * 100.0
    );
    out += &format!(
        "   sell   | demand {} | sold {} | unsold {} | attractiveness {}\n",
        r.demand, r.sold, r.unsold_units, r.attractiveness
    );
    out += &format!(
        "   money  | revenue {} | royalties {} | warranty {} | fixed {} | R&D {} | marketing {} | interest {}\n",
        r.revenue,
        r.royalties,
        r.warranty_cost,
        r.fixed_costs,
        r.rnd_spend,
        r.marketing_spend,
        r.interest
    );
    out += &format!(
        "   result | profit {} | cash {} -> {} | debt {} (+{}) | valuation {}\n",
        r.profit, r.cash_before, r.cash_after, r.debt_after, r.debt_issued, r.valuation
    );
    out += &format!(
        "   brand  | reputation {:.0} -> {:.0} ({:+.0}) | share {:.1}% -> {:.1}% | rivals {:.2} | OS {:.1} / eco {:.1}",
        r.reputation_before,
        r.reputation_after,
        r.reputation_delta,
        r.share_before * 100.0,
        r.share_after * 100.0,
        r.rivals_power,
        r.os_maturity,
        r.dev_ecosystem
    );
    out
}

fn render_status(s: &CompanyState) -> String {
    let date = s
        .time
        .start_date()
        .map(|d: NaiveDate| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "Next: {} (from {}) | {} {} @ {} via {} | cash {} | debt {} | reputation {:.0} | share {:.1}% | interest {}",
        s.time,
        date,
        s.tier.as_str(),
        s.os_mode.as_str(),
        s.price,
        s.channel.as_str(),
        s.cash,
        s.debt,
        s.reputation,
        s.market_share * 100.0,
        market_interest_level(s).label()
    )
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    let file = load_file_config(args.config.as_ref())?;

    let mut config = file.sim;
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    if let Some(dir) = args.save_dir {
        config.save_dir = dir;
    }
    if let Some(key) = args.key {
        config.state_key = key;
    }
    let quarters = args.quarters.or(file.quarters).unwrap_or(1);
    let decision = merge_decisions(file.decision, args.decision);
    info!(seed = config.rng_seed, save_dir = %config.save_dir.display(), quarters, "starting");

    let store = FileStore::new(&config.save_dir);
    let mut session = Session::open(config, Box::new(store));
    if args.reset {
        session.reset();
    }
    session.apply(&decision);

    for report in session.run_quarters(quarters) {
        println!("{}", render_report(&report));
    }
    println!("{}", render_status(session.state()));

    if let Some(err) = session.last_persist_error() {
        warn!(error = err, "progress was not saved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{Channel, OsMode, Tier};

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn decision_flags_are_coerced() {
        let a = args(&[
            "--tier", "premium", "--price", "899.99", "--quality", "150", "--rnd", "-5",
            "--os", "open", "--channel", "carrier", "--buy", "abc", "--reset",
        ])
        .unwrap();
        assert!(a.reset);
        assert_eq!(a.decision.tier, Some(Tier::Premium));
        assert_eq!(a.decision.price, Some(Decimal::new(899, 0)));
        assert_eq!(a.decision.quality, Some(100));
        assert_eq!(a.decision.rnd_spend, Some(Decimal::ZERO));
        assert_eq!(a.decision.os_mode, Some(OsMode::Open));
        assert_eq!(a.decision.channel, Some(Channel::Carrier));
        assert_eq!(a.decision.buy_units, Some(0));
    }

    #[test]
    fn help_is_not_an_error() {
        let a = args(&["--seed", "9", "--help", "--bogus"]).unwrap();
        assert!(a.help);
        assert_eq!(a.seed, Some(9));
    }

    #[test]
    fn bad_flags_rejected() {
        assert!(args(&["--tier", "luxury"]).is_err());
        assert!(args(&["--frobnicate", "1"]).is_err());
        assert!(args(&["--quarters"]).is_err());
    }

    #[test]
    fn yaml_config_merges_with_flags() {
        let file: FileConfig = serde_yaml::from_str(
            "rng_seed: 7\nquarters: 4\ndecision:\n  tier: budget\n  price: 149\n",
        )
        .unwrap();
        assert_eq!(file.sim.rng_seed, 7);
        assert_eq!(file.sim.state_key, sim_core::DEFAULT_STATE_KEY);
        assert_eq!(file.quarters, Some(4));
        let flags = args(&["--price", "179"]).unwrap().decision;
        let d = merge_decisions(file.decision, flags);
        assert_eq!(d.tier, Some(Tier::Budget));
        assert_eq!(d.price, Some(Decimal::new(179, 0)));
    }

    #[test]
    fn report_mentions_period_and_profit() {
        let mut state = CompanyState::default();
        let r = sim_runtime::advance_quarter(&mut state, &mut sim_econ::FixedSource(0.5));
        let text = render_report(&r);
        assert!(text.starts_with("== 2000 Q1"));
        assert!(text.contains(&format!("profit {}", r.profit)));
        assert!(render_status(&state).starts_with("Next: 2000 Q2 (from 2000-04-01)"));
    }
}

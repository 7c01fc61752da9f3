use anyhow::Result;
use colored::{ColoredString, Colorize};
use objsync_engine::{CapabilitySource, Outcome};
use objsync_engine::amm::{AmmConfigOverview, CapabilitySummary, ResourceSummary};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_field(name: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", name.cyan(), value);
}

fn outcome(outcome: Outcome) -> ColoredString {
    match outcome {
        Outcome::Reused => "reused".dimmed(),
        Outcome::Created => "created".green(),
        Outcome::Recreated => "recreated".yellow(),
    }
}

pub fn print_resource(resource: &ResourceSummary) {
    print_success(&format!(
        "{} {} {} ({})",
        resource.kind,
        resource.label.bold(),
        resource.object_id,
        outcome(resource.outcome)
    ));
    if let Some(digest) = &resource.digest {
        if resource.outcome.is_new() {
            print_field("digest", digest);
        }
    }
}

pub fn print_capability(capability: &CapabilitySummary) {
    let source = match capability.source {
        CapabilitySource::Explicit => "explicit",
        CapabilitySource::Owned => "owned",
        CapabilitySource::Claimed => "claimed",
    };
    print_field("admin cap", format!("{} ({source})", capability.object_id));
    if let Some(digest) = &capability.claim_digest {
        print_field("claim digest", digest);
    }
}

pub fn print_config(overview: &AmmConfigOverview) {
    let values = &overview.values;
    print_field("config", overview.config_id);
    print_field("type", &overview.object_type);
    print_field("version", overview.version);
    if let Some(initial) = overview.initial_shared_version {
        print_field("initial shared version", initial);
    }
    print_field("base spread bps", values.base_spread_bps);
    print_field("volatility multiplier bps", values.volatility_multiplier_bps);
    print_field("use laser", values.use_laser);
    print_field("trading paused", values.trading_paused);
    print_field("pyth price feed id", &values.pyth_price_feed_id);
}

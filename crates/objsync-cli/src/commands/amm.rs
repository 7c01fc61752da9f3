use anyhow::Result;
use colored::Colorize;
use objsync_engine::amm::{
    self, CreateOptions, FeedSelector, SeedOptions, UpdateOptions, ViewOptions,
};

use crate::cli::{CreateArgs, FeedArgs, SeedArgs, UpdateArgs, ViewArgs};
use crate::context::{Context, amm_settings};
use crate::output::{
    print_capability, print_config, print_field, print_json, print_resource, print_success,
};

fn feed(args: &FeedArgs) -> FeedSelector {
    FeedSelector {
        feed_id: args.feed_id.clone(),
        feed_label: args.feed_label.clone(),
    }
}

fn dry_run_note(dry_run: bool) {
    if dry_run {
        println!("{}", "dry run: nothing was executed or recorded".yellow());
    }
}

pub async fn seed(ctx: &Context, args: &SeedArgs, json: bool) -> Result<()> {
    let options = SeedOptions {
        package_id: args.package_id.clone(),
        re_publish: args.re_publish,
        admin_cap_id: args.admin_cap_id.clone(),
        feed: feed(&args.feed),
    };
    let report = amm::seed(
        &ctx.reconciler,
        &ctx.builder,
        &amm_settings(&ctx.config),
        &options,
    )
    .await?;

    if json {
        return print_json(&report);
    }
    print_resource(&report.package);
    print_resource(&report.config);
    if let Some(capability) = &report.admin_cap {
        print_capability(capability);
    }
    dry_run_note(report.dry_run);
    Ok(())
}

pub async fn create(ctx: &Context, args: &CreateArgs, json: bool) -> Result<()> {
    let options = CreateOptions {
        package_id: args.package_id.clone(),
        label: args.label.clone(),
        base_spread_bps: args.base_spread_bps.clone(),
        volatility_multiplier_bps: args.volatility_multiplier_bps.clone(),
        use_laser: args.use_laser,
        feed: feed(&args.feed),
    };
    let report = amm::create(&ctx.reconciler, &amm_settings(&ctx.config), &options).await?;

    if json {
        return print_json(&report);
    }
    print_resource(&report.config);
    print_field("package", report.package_id);
    print_field("base spread bps", report.base_spread_bps);
    print_field("volatility multiplier bps", report.volatility_multiplier_bps);
    print_field("use laser", report.use_laser);
    print_field("pyth price feed id", &report.pyth_price_feed_id);
    if report.attempts > 1 {
        print_field("attempts", report.attempts);
    }
    dry_run_note(report.dry_run);
    Ok(())
}

pub async fn update(ctx: &Context, args: &UpdateArgs, json: bool) -> Result<()> {
    let options = UpdateOptions {
        package_id: args.package_id.clone(),
        config_id: args.config_id.clone(),
        admin_cap_id: args.admin_cap_id.clone(),
        base_spread_bps: args.base_spread_bps.clone(),
        volatility_multiplier_bps: args.volatility_multiplier_bps.clone(),
        use_laser: args.use_laser,
        trading_paused: args.trading_paused,
        feed: feed(&args.feed),
    };
    let report = amm::update(&ctx.reconciler, &amm_settings(&ctx.config), &options).await?;

    if json {
        return print_json(&report);
    }
    print_success(&format!("updated AMM config {}", report.config_id));
    print_field("digest", &report.digest);
    print_capability(&report.capability);
    println!("{}", "Before".bold());
    print_config(&report.before);
    if let Some(after) = &report.after {
        println!("{}", "After".bold());
        print_config(after);
    }
    dry_run_note(report.dry_run);
    Ok(())
}

pub async fn view(ctx: &Context, args: &ViewArgs, json: bool) -> Result<()> {
    let options = ViewOptions {
        package_id: args.package_id.clone(),
        config_id: args.config_id.clone(),
    };
    let overview = amm::view(&ctx.reconciler, &options).await?;

    if json {
        return print_json(&overview);
    }
    print_config(&overview);
    Ok(())
}

use anyhow::{Result, bail};
use colored::Colorize;
use objsync_engine::bootstrap::{MockSetupOptions, run_mock_setup};

use crate::cli::MockSetupArgs;
use crate::context::{Context, mock_settings};
use crate::output::{print_error, print_field, print_json, print_resource, print_success, print_warning};

pub async fn setup(ctx: &Context, args: &MockSetupArgs, json: bool) -> Result<()> {
    let options = MockSetupOptions {
        pyth_package_id: args.pyth_package_id.clone(),
        coin_package_id: args.coin_package_id.clone(),
        re_publish: args.re_publish,
        buyer_address: args.buyer_address.clone(),
    };
    let settings = mock_settings(&ctx.config);

    let report = run_mock_setup(&ctx.reconciler, &ctx.builder, &settings, &options).await?;

    if json {
        print_json(&report)?;
    } else {
        println!("{}", "Packages".bold());
        report.packages.iter().for_each(print_resource);
        println!("{}", "Coins".bold());
        report.coins.iter().for_each(print_resource);
        println!("{}", "Price feeds".bold());
        report.feeds.iter().for_each(print_resource);

        if let Some(digest) = &report.refresh_digest {
            print_success("price feeds refreshed");
            print_field("digest", digest);
        }
        for transfer in &report.transfers {
            print_success(&format!(
                "sent {} of {} to {}",
                transfer.amount, transfer.coin_type, transfer.recipient
            ));
        }
        for skipped in &report.skipped {
            print_warning(&format!("skipped {skipped}"));
        }
        for failure in &report.failures {
            print_error(&format!(
                "{}/{} failed at {}: {}",
                failure.kind, failure.label, failure.stage, failure.message
            ));
        }
    }

    if !report.is_success() {
        bail!("{} resource(s) failed", report.failures.len());
    }
    Ok(())
}

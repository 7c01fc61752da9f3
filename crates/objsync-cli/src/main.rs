mod cli;
mod commands;
mod context;
mod output;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AmmCommands, Cli, Commands, ConfigCommands, MockCommands};
use context::Context;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins
/// over `logging.level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = objsync_config::loader::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(network) = &cli.network {
        config
            .override_network(network)
            .context("Invalid --network")?;
    }
    init_tracing(&config.logging.level);

    match &cli.command {
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => commands::config::show(&config, cli.json)?,
        },
        Commands::Mock(args) => match &args.command {
            MockCommands::Setup(setup) => {
                let ctx = Context::connect(config, false).await?;
                commands::mock::setup(&ctx, setup, cli.json).await?;
            }
        },
        Commands::Amm(args) => match &args.command {
            AmmCommands::Seed(seed) => {
                let ctx = Context::connect(config, seed.dry_run).await?;
                commands::amm::seed(&ctx, seed, cli.json).await?;
            }
            AmmCommands::Create(create) => {
                let ctx = Context::connect(config, create.dry_run).await?;
                commands::amm::create(&ctx, create, cli.json).await?;
            }
            AmmCommands::Update(update) => {
                let ctx = Context::connect(config, update.dry_run).await?;
                commands::amm::update(&ctx, update, cli.json).await?;
            }
            AmmCommands::View(view) => {
                let ctx = Context::connect(config, false).await?;
                commands::amm::view(&ctx, view, cli.json).await?;
            }
        },
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "objsync")]
#[command(about = "objsync: idempotent provisioning of Sui mock infrastructure and AMM configs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./objsync.toml when present)
    #[arg(short, long, global = true, env = "OBJSYNC_CONFIG")]
    pub config: Option<String>,

    /// Network name, overrides `network.name`
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Print one JSON document on stdout instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Localnet mock packages, coins and price feeds
    Mock(MockArgs),
    /// AMM package and config objects
    Amm(AmmArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct MockArgs {
    #[command(subcommand)]
    pub command: MockCommands,
}

#[derive(Subcommand)]
pub enum MockCommands {
    /// Publish or reuse the mock packages, coins and feeds, then refresh prices
    Setup(MockSetupArgs),
}

#[derive(Args)]
pub struct MockSetupArgs {
    /// Use an existing mock Pyth package
    #[arg(long)]
    pub pyth_package_id: Option<String>,
    /// Use an existing mock coin package
    #[arg(long)]
    pub coin_package_id: Option<String>,
    /// Ignore recorded artifacts and publish everything again
    #[arg(long)]
    pub re_publish: bool,
    /// Send a quarter of each newly minted coin to this address
    #[arg(long)]
    pub buyer_address: Option<String>,
}

#[derive(Args)]
pub struct AmmArgs {
    #[command(subcommand)]
    pub command: AmmCommands,
}

#[derive(Subcommand)]
pub enum AmmCommands {
    /// Ensure the AMM package and a config object exist
    Seed(SeedArgs),
    /// Create a new AMM config object
    Create(CreateArgs),
    /// Patch an existing AMM config
    Update(UpdateArgs),
    /// Show an AMM config
    View(ViewArgs),
}

#[derive(Args, Default)]
pub struct FeedArgs {
    /// Pyth price feed id (32 bytes hex)
    #[arg(long)]
    pub feed_id: Option<String>,
    /// Label of a recorded or configured price feed
    #[arg(long)]
    pub feed_label: Option<String>,
}

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long)]
    pub package_id: Option<String>,
    #[arg(long)]
    pub re_publish: bool,
    #[arg(long)]
    pub admin_cap_id: Option<String>,
    #[command(flatten)]
    pub feed: FeedArgs,
    /// Simulate instead of executing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub package_id: Option<String>,
    /// Artifact label for the new config
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub base_spread_bps: Option<String>,
    #[arg(long)]
    pub volatility_multiplier_bps: Option<String>,
    #[arg(long)]
    pub use_laser: Option<bool>,
    #[command(flatten)]
    pub feed: FeedArgs,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub package_id: Option<String>,
    #[arg(long)]
    pub config_id: Option<String>,
    #[arg(long)]
    pub admin_cap_id: Option<String>,
    #[arg(long)]
    pub base_spread_bps: Option<String>,
    #[arg(long)]
    pub volatility_multiplier_bps: Option<String>,
    #[arg(long)]
    pub use_laser: Option<bool>,
    #[arg(long)]
    pub trading_paused: Option<bool>,
    #[command(flatten)]
    pub feed: FeedArgs,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ViewArgs {
    #[arg(long)]
    pub package_id: Option<String>,
    #[arg(long)]
    pub config_id: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_amm_update() {
        let cli = Cli::try_parse_from([
            "objsync",
            "--json",
            "amm",
            "update",
            "--config-id",
            "0xc1",
            "--trading-paused",
            "true",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.json);
        let Commands::Amm(AmmArgs {
            command: AmmCommands::Update(args),
        }) = cli.command
        else {
            panic!("expected amm update");
        };
        assert_eq!(args.config_id.as_deref(), Some("0xc1"));
        assert_eq!(args.trading_paused, Some(true));
        assert_eq!(args.use_laser, None);
        assert!(args.dry_run);
    }

    #[test]
    fn test_parse_mock_setup_with_global_network() {
        let cli = Cli::try_parse_from([
            "objsync",
            "mock",
            "setup",
            "--re-publish",
            "--network",
            "localnet",
        ])
        .unwrap();
        assert_eq!(cli.network.as_deref(), Some("localnet"));
        let Commands::Mock(MockArgs {
            command: MockCommands::Setup(args),
        }) = cli.command
        else {
            panic!("expected mock setup");
        };
        assert!(args.re_publish);
        assert!(args.pyth_package_id.is_none());
    }
}

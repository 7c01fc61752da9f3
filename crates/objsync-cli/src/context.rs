//! Wires configuration into a ready-to-run reconciler.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use objsync_config::{AppConfig, ArtifactBackend};
use objsync_core::{DynLedger, ObjectId};
use objsync_db_json::JsonFileArtifactStore;
use objsync_db_memory::InMemoryArtifactStore;
use objsync_engine::amm::{AmmSettings, mode_for};
use objsync_engine::bootstrap::MockSetupSettings;
use objsync_engine::{FundingExecutor, Reconciler, RetryPolicy, WaitPolicy};
use objsync_rpc::{KeytoolSigner, SuiMoveBuilder, SuiRpcClient};
use objsync_storage::DynArtifactStore;

/// Everything a command needs for one run.
pub struct Context {
    pub config: AppConfig,
    pub reconciler: Reconciler,
    pub builder: SuiMoveBuilder,
}

impl Context {
    pub async fn connect(config: AppConfig, dry_run: bool) -> Result<Self> {
        let rpc_url = config.network.rpc_url();
        let ledger: DynLedger = Arc::new(
            SuiRpcClient::new(&rpc_url)
                .context("Failed to create RPC client")?
                .with_faucet(config.network.faucet_url()),
        );

        let signer = match &config.signer.address {
            Some(address) => {
                let address = ObjectId::parse(address).context("Invalid signer.address")?;
                KeytoolSigner::new(&config.signer.sui_binary, address)
            }
            None => KeytoolSigner::from_active_address(&config.signer.sui_binary)
                .await
                .context("Failed to determine the active sui address")?,
        };

        let policy = RetryPolicy::new(config.executor.max_attempts, config.executor.retry_delay());
        let executor = FundingExecutor::new(ledger, Arc::new(signer), policy)
            .with_gas_budget(config.executor.gas_budget);

        tracing::info!(
            network = %config.network.name,
            %rpc_url,
            signer = %executor.address(),
            dry_run,
            "connected"
        );

        let reconciler = Reconciler::new(artifact_store(&config), executor, &config.network.name)
            .with_mode(mode_for(dry_run))
            .with_wait(WaitPolicy {
                timeout: config.wait.timeout(),
                interval: config.wait.interval(),
            });

        Ok(Self {
            builder: SuiMoveBuilder::new(&config.signer.sui_binary),
            config,
            reconciler,
        })
    }
}

pub fn artifact_store(config: &AppConfig) -> DynArtifactStore {
    match config.artifacts.backend {
        ArtifactBackend::Json => Arc::new(JsonFileArtifactStore::new(config.artifacts.dir.clone())),
        ArtifactBackend::Memory => Arc::new(InMemoryArtifactStore::new()),
    }
}

pub fn amm_settings(config: &AppConfig) -> AmmSettings {
    AmmSettings {
        package_path: config.packages.amm.clone(),
        is_localnet: config.is_localnet(),
        with_unpublished_dependencies: config.is_localnet(),
        base_spread_bps: config.amm.base_spread_bps,
        volatility_multiplier_bps: config.amm.volatility_multiplier_bps,
        use_laser: config.amm.use_laser,
        feed_label: config.amm.feed_label.clone(),
        feeds: config.feeds.clone(),
    }
}

pub fn mock_settings(config: &AppConfig) -> MockSetupSettings {
    MockSetupSettings {
        is_localnet: config.is_localnet(),
        pyth_path: config.packages.pyth.clone(),
        coin_path: config.packages.coin.clone(),
        with_unpublished_dependencies: true,
        feeds: config.feeds.clone(),
        coins: config.coins.clone(),
    }
}

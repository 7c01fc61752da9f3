//! Configuration for objsync.
//!
//! Settings come from an optional `objsync.toml` and are overridden by
//! `OBJSYNC__SECTION__KEY` environment variables; see [`loader`].

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use objsync_core::{CoinSeed, DEFAULT_GAS_BUDGET, ObjectId, PriceFeedConfig};
use serde::{Deserialize, Serialize};

mod error;
pub mod loader;

pub use error::ConfigError;

pub const LOCALNET: &str = "localnet";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub amm: AmmDefaults,
    /// Mock price feeds seeded on localnet.
    #[serde(default = "default_feeds")]
    pub feeds: Vec<PriceFeedConfig>,
    /// Mock coins seeded on localnet.
    #[serde(default = "default_coins")]
    pub coins: Vec<CoinSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            signer: SignerConfig::default(),
            artifacts: ArtifactsConfig::default(),
            executor: ExecutorConfig::default(),
            wait: WaitConfig::default(),
            logging: LoggingConfig::default(),
            packages: PackagesConfig::default(),
            amm: AmmDefaults::default(),
            feeds: default_feeds(),
            coins: default_coins(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.name.trim().is_empty() {
            return Err(ConfigError::validation("network.name must not be empty"));
        }
        // The name becomes part of the artifact file name.
        if !self
            .network
            .name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(ConfigError::validation(format!(
                "network.name may only contain [a-z0-9_-], got {:?}",
                self.network.name
            )));
        }
        let rpc_url = self.network.rpc_url();
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(ConfigError::validation(format!(
                "network.rpc_url must be an http(s) URL, got {rpc_url}"
            )));
        }
        if let Some(address) = &self.signer.address {
            ObjectId::parse(address)
                .map_err(|e| ConfigError::validation(format!("signer.address: {e}")))?;
        }
        if self.signer.sui_binary.trim().is_empty() {
            return Err(ConfigError::validation("signer.sui_binary must not be empty"));
        }
        if self.executor.max_attempts == 0 {
            return Err(ConfigError::validation("executor.max_attempts must be > 0"));
        }
        if self.executor.gas_budget == 0 {
            return Err(ConfigError::validation("executor.gas_budget must be > 0"));
        }
        if self.wait.interval_ms == 0 {
            return Err(ConfigError::validation("wait.interval_ms must be > 0"));
        }
        if self.wait.timeout_ms < self.wait.interval_ms {
            return Err(ConfigError::validation(
                "wait.timeout_ms must be >= wait.interval_ms",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        if self.amm.base_spread_bps == 0 {
            return Err(ConfigError::validation("amm.base_spread_bps must be > 0"));
        }

        let mut labels = HashSet::new();
        for feed in &self.feeds {
            if !labels.insert(feed.label.as_str()) {
                return Err(ConfigError::validation(format!(
                    "duplicate feed label {}",
                    feed.label
                )));
            }
            feed.feed_id_bytes()
                .map_err(|e| ConfigError::validation(format!("feeds.{}: {e}", feed.label)))?;
        }

        for coin in &self.coins {
            if [&coin.label, &coin.module, &coin.type_name, &coin.init_function]
                .iter()
                .any(|field| field.trim().is_empty())
            {
                return Err(ConfigError::validation(format!(
                    "coin seed {:?} has an empty field",
                    coin.label
                )));
            }
        }
        Ok(())
    }

    /// Switches to another network and validates the result.
    pub fn override_network(&mut self, name: &str) -> Result<(), ConfigError> {
        self.network.name = name.to_string();
        self.validate()
    }

    pub fn is_localnet(&self) -> bool {
        self.network.name == LOCALNET
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_name")]
    pub name: String,
    /// Defaults to the public fullnode of `name`.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Defaults to the local or devnet faucet; other networks have none.
    #[serde(default)]
    pub faucet_url: Option<String>,
}

fn default_network_name() -> String {
    LOCALNET.into()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            rpc_url: None,
            faucet_url: None,
        }
    }
}

impl NetworkConfig {
    pub fn rpc_url(&self) -> String {
        if let Some(url) = &self.rpc_url {
            return url.clone();
        }
        match self.name.as_str() {
            LOCALNET => "http://127.0.0.1:9000".into(),
            other => format!("https://fullnode.{other}.sui.io:443"),
        }
    }

    pub fn faucet_url(&self) -> Option<String> {
        if let Some(url) = &self.faucet_url {
            return Some(url.clone());
        }
        match self.name.as_str() {
            LOCALNET => Some("http://127.0.0.1:9123/gas".into()),
            "devnet" => Some("https://faucet.devnet.sui.io/gas".into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Acting address; the active `sui client` address when unset.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_sui_binary")]
    pub sui_binary: String,
}

fn default_sui_binary() -> String {
    "sui".into()
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            address: None,
            sui_binary: default_sui_binary(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactBackend {
    #[default]
    Json,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub backend: ArtifactBackend,
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("deployments")
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            backend: ArtifactBackend::default(),
            dir: default_artifacts_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_gas_budget() -> u64 {
    DEFAULT_GAS_BUDGET
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            gas_budget: default_gas_budget(),
        }
    }
}

impl ExecutorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Package availability polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_wait_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_wait_interval_ms")]
    pub interval_ms: u64,
}

fn default_wait_timeout_ms() -> u64 {
    20_000
}
fn default_wait_interval_ms() -> u64 {
    250
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_wait_timeout_ms(),
            interval_ms: default_wait_interval_ms(),
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Move package source directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    #[serde(default = "default_pyth_path")]
    pub pyth: PathBuf,
    #[serde(default = "default_coin_path")]
    pub coin: PathBuf,
    #[serde(default = "default_amm_path")]
    pub amm: PathBuf,
}

fn default_pyth_path() -> PathBuf {
    PathBuf::from("move/pyth-mock")
}
fn default_coin_path() -> PathBuf {
    PathBuf::from("move/coin-mock")
}
fn default_amm_path() -> PathBuf {
    PathBuf::from("move/prop_amm")
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            pyth: default_pyth_path(),
            coin: default_coin_path(),
            amm: default_amm_path(),
        }
    }
}

/// Values used when creating an AMM config without explicit inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmDefaults {
    #[serde(default = "default_base_spread_bps")]
    pub base_spread_bps: u64,
    #[serde(default = "default_volatility_multiplier_bps")]
    pub volatility_multiplier_bps: u64,
    #[serde(default)]
    pub use_laser: bool,
    #[serde(default = "default_feed_label")]
    pub feed_label: String,
}

fn default_base_spread_bps() -> u64 {
    25
}
fn default_volatility_multiplier_bps() -> u64 {
    200
}
fn default_feed_label() -> String {
    objsync_core::DEFAULT_FEED_LABEL.into()
}

impl Default for AmmDefaults {
    fn default() -> Self {
        Self {
            base_spread_bps: default_base_spread_bps(),
            volatility_multiplier_bps: default_volatility_multiplier_bps(),
            use_laser: false,
            feed_label: default_feed_label(),
        }
    }
}

fn default_feeds() -> Vec<PriceFeedConfig> {
    vec![PriceFeedConfig::mock_sui()]
}

fn default_coins() -> Vec<CoinSeed> {
    vec![CoinSeed::local_mock_usd()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = defaults();
        cfg.validate().unwrap();
        assert!(cfg.is_localnet());
        assert_eq!(cfg.network.rpc_url(), "http://127.0.0.1:9000");
        assert_eq!(cfg.wait.timeout(), Duration::from_secs(20));
        assert_eq!(cfg.wait.interval(), Duration::from_millis(250));
        assert_eq!(cfg.executor.max_attempts, 3);
        assert_eq!(cfg.amm.base_spread_bps, 25);
        assert_eq!(cfg.amm.volatility_multiplier_bps, 200);
    }

    #[test]
    fn test_network_urls() {
        let net = NetworkConfig {
            name: "testnet".into(),
            ..NetworkConfig::default()
        };
        assert_eq!(net.rpc_url(), "https://fullnode.testnet.sui.io:443");
        assert!(net.faucet_url().is_none());
    }

    #[test]
    fn test_network_override_is_validated() {
        let mut cfg = defaults();
        cfg.override_network("devnet").unwrap();
        assert_eq!(cfg.network.name, "devnet");
        assert!(!cfg.is_localnet());

        assert!(cfg.override_network("").is_err());
        let err = cfg.override_network("../../etc").unwrap_err();
        assert!(err.to_string().contains("network.name"));
        assert!(cfg.override_network("Testnet").is_err());
    }

    #[test]
    fn test_duplicate_feed_label_rejected() {
        let mut cfg = defaults();
        cfg.feeds.push(PriceFeedConfig::mock_sui());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate feed label"));
    }

    #[test]
    fn test_bad_feed_id_rejected() {
        let mut cfg = defaults();
        cfg.feeds[0].feed_id = "0x1234".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_default_coin_seed() {
        let cfg = defaults();
        assert_eq!(cfg.coins, vec![CoinSeed::local_mock_usd()]);
    }
}

use std::{env, fs};

use objsync_config::ArtifactBackend;
use objsync_config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("objsync.toml");

    let toml_content = r#"
[network]
name = "localnet"
rpc_url = "http://127.0.0.1:19000"

[artifacts]
backend = "memory"
dir = "state"

[executor]
max_attempts = 5

[wait]
timeout_ms = 5000
interval_ms = 100

[logging]
level = "debug"

[amm]
base_spread_bps = 30

[[feeds]]
label = "MOCK_ETH_FEED"
feed_id = "0x0101010101010101010101010101010101010101010101010101010101010101"
price = -250000
exponent = -4
confidence = 10
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses, unspecified values keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.network.rpc_url(), "http://127.0.0.1:19000");
    assert_eq!(cfg.artifacts.backend, ArtifactBackend::Memory);
    assert_eq!(cfg.executor.max_attempts, 5);
    assert_eq!(cfg.executor.retry_delay_ms, 500);
    assert_eq!(cfg.wait.interval_ms, 100);
    assert_eq!(cfg.amm.base_spread_bps, 30);
    assert_eq!(cfg.amm.volatility_multiplier_bps, 200);
    assert_eq!(cfg.feeds.len(), 1);
    assert_eq!(cfg.feeds[0].price, -250000);
    assert_eq!(cfg.coins.len(), 1);

    // 2) Env override should win over file
    unsafe {
        env::set_var("OBJSYNC__EXECUTOR__MAX_ATTEMPTS", "7");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.executor.max_attempts, 7);
    unsafe {
        env::remove_var("OBJSYNC__EXECUTOR__MAX_ATTEMPTS");
    }

    // 3) Invalid config (timeout shorter than interval) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[wait]
timeout_ms = 100
interval_ms = 250
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.to_string().contains("wait.timeout_ms must be >="));

    // 4) Explicit missing file is an error
    let missing = dir.path().join("missing.toml");
    assert!(load_config(missing.to_str()).is_err());
}

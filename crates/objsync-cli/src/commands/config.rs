use anyhow::{Context, Result};
use objsync_config::AppConfig;

use crate::output::print_json;

pub fn show(config: &AppConfig, json: bool) -> Result<()> {
    if json {
        return print_json(config);
    }
    let rendered = config
        .to_toml_string()
        .context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

//! Runs the `sui` binary and captures its JSON output.

use std::ffi::OsStr;

use serde_json::Value;
use tokio::process::Command;

/// Why a tool invocation failed.
#[derive(Debug)]
pub(crate) enum ToolError {
    Spawn(String),
    Exit(String),
    Output(String),
}

impl ToolError {
    pub(crate) fn message(self) -> String {
        match self {
            Self::Spawn(message) | Self::Exit(message) | Self::Output(message) => message,
        }
    }
}

/// Runs `binary args..` and parses stdout as JSON. Build chatter before the
/// JSON document is skipped.
pub(crate) async fn run_json<I, S>(binary: &str, args: I) -> Result<Value, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(binary)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ToolError::Spawn(format!("failed to run {binary}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Exit(format!(
            "{binary} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_json_output(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| ToolError::Output(format!("{binary} printed no JSON document")))
}

pub(crate) fn parse_json_output(stdout: &str) -> Option<Value> {
    let trimmed = stdout.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find(['{', '['])?;
    serde_json::from_str(&trimmed[start..]).ok()
}

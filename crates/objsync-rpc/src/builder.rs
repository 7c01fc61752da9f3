//! Move package compilation through `sui move build`.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use objsync_core::{CompiledPackage, LedgerError, LedgerResult, ObjectId, PackageBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::process::{ToolError, run_json};

pub struct SuiMoveBuilder {
    binary: String,
}

impl SuiMoveBuilder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildOutput {
    modules: Vec<String>,
    #[serde(default)]
    dependencies: Vec<ObjectId>,
}

fn parse_build_output(output: Value) -> LedgerResult<CompiledPackage> {
    let output: BuildOutput = serde_json::from_value(output)
        .map_err(|e| LedgerError::decode(format!("unexpected build output: {e}")))?;
    if output.modules.is_empty() {
        return Err(LedgerError::execution_failed("package has no modules"));
    }
    Ok(CompiledPackage {
        modules: output.modules,
        dependencies: output.dependencies,
    })
}

#[async_trait]
impl PackageBuilder for SuiMoveBuilder {
    async fn build(
        &self,
        path: &Path,
        with_unpublished_dependencies: bool,
    ) -> LedgerResult<CompiledPackage> {
        let mut args: Vec<OsString> = vec![
            "move".into(),
            "build".into(),
            "--dump-bytecode-as-base64".into(),
            "--path".into(),
            path.as_os_str().to_owned(),
        ];
        if with_unpublished_dependencies {
            args.push("--with-unpublished-dependencies".into());
        }

        tracing::info!(path = %path.display(), with_unpublished_dependencies, "building move package");
        let output = run_json(&self.binary, args).await.map_err(|e| match e {
            ToolError::Output(message) => LedgerError::decode(message),
            other => LedgerError::execution_failed(format!("move build failed: {}", other.message())),
        })?;
        parse_build_output(output)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_build_output() {
        let package = parse_build_output(json!({
            "modules": ["oRzrCwYAAAAKAQAC"],
            "dependencies": ["0x1", "0x2"],
            "digest": [1, 2, 3]
        }))
        .unwrap();
        assert_eq!(package.modules.len(), 1);
        assert_eq!(
            package.dependencies,
            vec![ObjectId::short(1), ObjectId::short(2)]
        );
    }

    #[test]
    fn test_empty_package_is_rejected() {
        assert!(parse_build_output(json!({ "modules": [] })).is_err());
        assert!(parse_build_output(json!({ "bytecode": "x" })).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_fails_build() {
        let builder = SuiMoveBuilder::new("objsync-no-such-binary");
        let err = builder.build(Path::new("."), false).await.unwrap_err();
        assert!(matches!(err, LedgerError::ExecutionFailed { .. }));
    }
}

//! Signing through `sui keytool`.
//!
//! Keys never leave the local keystore; the CLI signs the intent message
//! for us and we only read the serialized signature back.

use async_trait::async_trait;
use objsync_core::{Address, LedgerError, LedgerResult, ObjectId, Signer};
use serde_json::Value;

use crate::process::run_json;

pub struct KeytoolSigner {
    binary: String,
    address: Address,
}

impl KeytoolSigner {
    pub fn new(binary: impl Into<String>, address: Address) -> Self {
        Self {
            binary: binary.into(),
            address,
        }
    }

    /// Uses the active address of the local `sui client` configuration.
    pub async fn from_active_address(binary: impl Into<String>) -> LedgerResult<Self> {
        let binary = binary.into();
        let output = run_json(&binary, ["client", "active-address", "--json"])
            .await
            .map_err(|e| LedgerError::signing(e.message()))?;
        let address = parse_active_address(&output)?;
        tracing::debug!(%address, "using active sui client address");
        Ok(Self::new(binary, address))
    }
}

fn parse_active_address(output: &Value) -> LedgerResult<Address> {
    let raw = output
        .as_str()
        .ok_or_else(|| LedgerError::signing("no active address configured"))?;
    ObjectId::parse(raw).map_err(|e| LedgerError::signing(format!("active address: {e}")))
}

fn parse_signature(output: &Value) -> LedgerResult<String> {
    output
        .get("suiSignature")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LedgerError::signing("keytool output has no suiSignature"))
}

#[async_trait]
impl Signer for KeytoolSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx_bytes_b64: &str) -> LedgerResult<String> {
        let address = self.address.to_string();
        let output = run_json(
            &self.binary,
            [
                "keytool",
                "sign",
                "--address",
                address.as_str(),
                "--data",
                tx_bytes_b64,
                "--json",
            ],
        )
        .await
        .map_err(|e| LedgerError::signing(e.message()))?;
        parse_signature(&output)
    }
}

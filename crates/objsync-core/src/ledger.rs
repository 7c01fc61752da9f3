//! Ledger client and signer abstractions.
//!
//! The engine only talks to the ledger through [`LedgerClient`]; the
//! JSON-RPC implementation lives in `objsync-rpc`; the engine's unit tests
//! use a scripted fake.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::id::{Address, ObjectId};
use crate::object::{CoinBalance, DiscoveredResource};
use crate::transaction::{ExecutionMode, PublishPlan, TransactionEffects, TransactionPlan};

/// The native gas coin type.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Errors reported by ledger clients and signers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The object does not exist or was deleted.
    #[error("Object not found: {object_id}")]
    NotFound {
        /// The id as it was requested.
        object_id: String,
    },

    /// The signer cannot pay for gas.
    #[error("Insufficient gas: {message}")]
    InsufficientGas {
        /// The ledger's description of the shortage.
        message: String,
    },

    /// An input object version was consumed by a concurrent transaction.
    #[error("Stale object: {message}")]
    StaleObject {
        /// The ledger's description of the conflicting input.
        message: String,
    },

    /// The transaction executed and aborted.
    #[error("Execution failed: {message}")]
    ExecutionFailed {
        /// Abort code or failure status reported in the effects.
        message: String,
    },

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The node could not be reached or answered with a non-success status.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the connection failure.
        message: String,
    },

    /// A response did not have the expected shape.
    #[error("Decode error: {message}")]
    Decode {
        /// What could not be decoded.
        message: String,
    },

    /// The signer refused or failed to sign.
    #[error("Signing failed: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The backend does not offer the operation, e.g. a faucet on mainnet.
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Which operation is missing.
        message: String,
    },
}

impl LedgerError {
    #[must_use]
    pub fn not_found(object_id: impl ToString) -> Self {
        Self::NotFound {
            object_id: object_id.to_string(),
        }
    }

    #[must_use]
    pub fn insufficient_gas(message: impl Into<String>) -> Self {
        Self::InsufficientGas {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn stale_object(message: impl Into<String>) -> Self {
        Self::StaleObject {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Classifies the error string of a failed execution status.
    #[must_use]
    pub fn from_execution_failure(message: &str) -> Self {
        const GAS_MARKERS: [&str; 3] = ["InsufficientGas", "GasBalanceTooLow", "insufficient gas"];
        const STALE_MARKERS: [&str; 4] = [
            "ObjectVersionUnavailableForConsumption",
            "not available for consumption",
            "already locked",
            "is not the latest version",
        ];

        if GAS_MARKERS.iter().any(|marker| message.contains(marker)) {
            Self::insufficient_gas(message)
        } else if STALE_MARKERS.iter().any(|marker| message.contains(marker)) {
            Self::stale_object(message)
        } else {
            Self::execution_failed(message)
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Gas shortage or a consumed object version. A refund and full rebuild
    /// may succeed.
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::InsufficientGas { .. } | Self::StaleObject { .. })
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InsufficientGas { .. } | Self::StaleObject { .. } => ErrorCategory::Contention,
            Self::ExecutionFailed { .. } => ErrorCategory::Execution,
            Self::Rpc { .. } | Self::Transport { .. } | Self::Decode { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::Signing { .. } => ErrorCategory::Authorization,
            Self::Unsupported { .. } => ErrorCategory::Internal,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Produces signatures for transaction bytes.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The acting address.
    fn address(&self) -> Address;

    /// Signs base64 transaction bytes and returns the serialized signature
    /// in base64.
    async fn sign(&self, tx_bytes_b64: &str) -> LedgerResult<String>;
}

/// Read and write access to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Reads the latest version of an object.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` when the object does not exist or was
    /// deleted.
    async fn get_object(&self, id: ObjectId) -> LedgerResult<DiscoveredResource>;

    async fn get_object_at_version(
        &self,
        id: ObjectId,
        version: u64,
    ) -> LedgerResult<DiscoveredResource>;

    /// Objects owned by `owner` whose type is exactly `struct_type`.
    async fn get_owned_objects(
        &self,
        owner: Address,
        struct_type: &str,
    ) -> LedgerResult<Vec<DiscoveredResource>>;

    async fn get_coins(&self, owner: Address, coin_type: &str) -> LedgerResult<Vec<CoinBalance>>;

    /// Builds, signs and submits (or dry-runs) a plan.
    async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &dyn Signer,
        mode: ExecutionMode,
    ) -> LedgerResult<TransactionEffects>;

    async fn publish(
        &self,
        plan: &PublishPlan,
        signer: &dyn Signer,
    ) -> LedgerResult<TransactionEffects>;

    /// Asks the network faucet for gas. Networks without a faucet return
    /// `LedgerError::Unsupported`.
    async fn request_funds(&self, address: Address) -> LedgerResult<()>;

    fn backend_name(&self) -> &'static str;
}

pub type DynLedger = Arc<dyn LedgerClient>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contention_classification() {
        assert!(LedgerError::insufficient_gas("no gas coins").is_contention());
        assert!(LedgerError::stale_object("version 4 unavailable").is_contention());
        assert!(!LedgerError::execution_failed("MoveAbort").is_contention());
        assert!(!LedgerError::not_found("0x1").is_contention());
    }

    #[test]
    fn test_execution_failure_classification() {
        assert!(LedgerError::from_execution_failure("InsufficientGas").is_contention());
        assert!(matches!(
            LedgerError::from_execution_failure(
                "Transaction needs to be rebuilt because object 0x6 version 0x3 is not available for consumption"
            ),
            LedgerError::StaleObject { .. }
        ));
        assert!(matches!(
            LedgerError::from_execution_failure("MoveAbort(..., 3)"),
            LedgerError::ExecutionFailed { .. }
        ));
    }

    #[test]
    fn test_category() {
        assert_eq!(
            LedgerError::stale_object("x").category(),
            ErrorCategory::Contention
        );
        assert_eq!(
            LedgerError::rpc(-32000, "boom").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            LedgerError::rpc(-32000, "boom").to_string(),
            "RPC error -32000: boom"
        );
    }
}

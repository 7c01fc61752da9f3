//! Provisioning errors.

use std::fmt;

use objsync_core::{CodecError, ErrorCategory, FieldError, LedgerError, ResourceKind};
use objsync_storage::StorageError;

/// The decision stage a resource had reached when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving inputs, ids and cached records.
    Resolve,
    /// Comparing a cached candidate with the live object.
    Validate,
    Authorize,
    Submit,
    /// Reading created ids out of transaction effects.
    Extract,
    /// Waiting for a published package to become observable.
    Wait,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::Validate => "validate",
            Self::Authorize => "authorize",
            Self::Submit => "submit",
            Self::Extract => "extract",
            Self::Wait => "wait",
            Self::Persist => "persist",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Field(#[from] FieldError),

    /// A user-supplied value was rejected before any ledger call.
    #[error("Invalid input: {message}")]
    Validation {
        /// Which input was rejected and why.
        message: String,
    },

    /// An explicitly named object does not exist.
    #[error("{what} {object_id} not found on-chain")]
    NotFound {
        /// What the object was expected to be, e.g. "package".
        what: String,
        /// The id that was looked up.
        object_id: String,
    },

    /// The retry bound was reached while the ledger kept reporting
    /// contention.
    #[error("Gave up after {attempts} attempts: {source}")]
    Contention {
        /// Attempts made, including the first.
        attempts: u32,
        /// The last contention failure.
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No capability is owned and a dry run may not claim one.
    #[error(
        "No {capability_type} owned by {owner}; pass an explicit capability id or run without --dry-run to claim one"
    )]
    MissingCapability {
        /// Fully-qualified capability type.
        capability_type: String,
        /// The acting address.
        owner: String,
    },

    /// The claim transaction ran but no capability showed up.
    #[error("Could not claim {capability_type}: {message}")]
    ClaimFailed {
        /// Fully-qualified capability type.
        capability_type: String,
        /// Why the claim did not produce a capability.
        message: String,
    },

    /// Two options ask for contradicting things.
    #[error("Conflicting options: {message}")]
    Conflict {
        /// The options that contradict each other.
        message: String,
    },

    /// A transaction succeeded but did not create the expected object.
    #[error("Transaction {digest} did not create an object of type *{type_suffix}")]
    MissingCreated {
        /// Suffix the created object type should end with.
        type_suffix: String,
        /// Digest of the transaction.
        digest: String,
    },

    /// A published object did not become observable in time.
    #[error("{object_id} not available after {waited_ms}ms")]
    Timeout {
        /// The object being polled.
        object_id: String,
        /// Time spent polling.
        waited_ms: u64,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProvisionError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>, object_id: impl ToString) -> Self {
        Self::NotFound {
            what: what.into(),
            object_id: object_id.to_string(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_created(type_suffix: impl Into<String>, digest: impl Into<String>) -> Self {
        Self::MissingCreated {
            type_suffix: type_suffix.into(),
            digest: digest.into(),
        }
    }

    #[must_use]
    pub fn claim_failed(capability_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClaimFailed {
            capability_type: capability_type.into(),
            message: message.into(),
        }
    }

    /// The stage an error of this shape is raised from.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Codec(_)
            | Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Conflict { .. } => Stage::Resolve,
            Self::Field(_) => Stage::Validate,
            Self::MissingCapability { .. } | Self::ClaimFailed { .. } => Stage::Authorize,
            Self::Contention { .. } | Self::Ledger(_) => Stage::Submit,
            Self::MissingCreated { .. } => Stage::Extract,
            Self::Timeout { .. } => Stage::Wait,
            Self::Storage(_) => Stage::Persist,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Codec(_) | Self::Validation { .. } | Self::Field(_) => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Contention { .. } => ErrorCategory::Contention,
            Self::Ledger(err) => err.category(),
            Self::MissingCapability { .. } | Self::ClaimFailed { .. } => {
                ErrorCategory::Authorization
            }
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::MissingCreated { .. } => ErrorCategory::Execution,
            Self::Timeout { .. } => ErrorCategory::Infrastructure,
            Self::Storage(err) => err.category(),
        }
    }
}

/// A fatal per-resource failure.
#[derive(Debug, thiserror::Error)]
#[error("{kind} {label:?} failed at {stage}: {source}")]
pub struct ReconcileError {
    pub kind: ResourceKind,
    pub label: String,
    pub stage: Stage,
    #[source]
    pub source: ProvisionError,
}

impl ReconcileError {
    pub fn new(kind: ResourceKind, label: impl Into<String>, source: ProvisionError) -> Self {
        Self {
            kind,
            label: label.into(),
            stage: source.stage(),
            source,
        }
    }

    /// Overrides the stage derived from the source error.
    #[must_use]
    pub fn at(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_error_carries_context() {
        let err = ReconcileError::new(
            ResourceKind::PriceFeed,
            "MOCK_SUI_FEED",
            ProvisionError::missing_created("::price_info::PriceInfoObject", "D1"),
        );
        assert_eq!(err.stage, Stage::Extract);
        assert_eq!(err.category(), ErrorCategory::Execution);
        assert_eq!(
            err.to_string(),
            "price_feed \"MOCK_SUI_FEED\" failed at extract: Transaction D1 did not create an object of type *::price_info::PriceInfoObject"
        );
    }

    #[test]
    fn test_ledger_category_passes_through() {
        let err = ProvisionError::from(LedgerError::stale_object("v3"));
        assert_eq!(err.category(), ErrorCategory::Contention);
        assert_eq!(err.stage(), Stage::Submit);

        let err = ProvisionError::Contention {
            attempts: 3,
            source: LedgerError::insufficient_gas("no coins"),
        };
        assert_eq!(err.to_string(), "Gave up after 3 attempts: Insufficient gas: no coins");
    }
}

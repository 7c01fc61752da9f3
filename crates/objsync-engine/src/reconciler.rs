//! Desired-state reconciliation for one resource at a time.
//!
//! A cached record is revalidated against the live ledger object. A match
//! is reused without submitting anything; a missing or mismatched object is
//! recreated by the kind-specific [`Provisioner`] and the new record is
//! merge-written to the artifact store.

use async_trait::async_trait;
use objsync_core::{
    Candidate, DynLedger, ExecutionMode, MatchOutcome, ResourceDescriptor, matches,
    matches_identity,
};
use objsync_storage::{ArtifactKey, ArtifactPatch, ArtifactRecord, ArtifactSet, DynArtifactStore};
use serde::Serialize;

use crate::error::{ProvisionResult, ReconcileError, Stage};
use crate::executor::FundingExecutor;
use crate::provision::attrs;
use crate::wait::WaitPolicy;

/// What `ensure` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The cached resource still matches.
    Reused,
    /// Nothing was cached.
    Created,
    /// The cached resource was gone or no longer matched.
    Recreated,
}

impl Outcome {
    pub fn is_new(&self) -> bool {
        !matches!(self, Self::Reused)
    }
}

#[derive(Debug, Clone)]
pub struct Provisioned {
    pub record: ArtifactRecord,
    pub outcome: Outcome,
    /// Submission attempts, zero on reuse.
    pub attempts: u32,
}

/// A freshly created resource.
#[derive(Debug, Clone)]
pub struct Creation {
    pub record: ArtifactRecord,
    pub attempts: u32,
}

/// Kind-specific creation.
#[async_trait]
pub trait Provisioner: Send + Sync {
    fn descriptor(&self) -> &ResourceDescriptor;

    /// Builds and submits the creation plan and extracts the created ids.
    async fn create(&self, reconciler: &Reconciler) -> ProvisionResult<Creation>;
}

/// Shared state of one provisioning run.
#[derive(Clone)]
pub struct Reconciler {
    store: DynArtifactStore,
    executor: FundingExecutor,
    network: String,
    mode: ExecutionMode,
    wait: WaitPolicy,
}

impl Reconciler {
    pub fn new(store: DynArtifactStore, executor: FundingExecutor, network: impl Into<String>) -> Self {
        Self {
            store,
            executor,
            network: network.into(),
            mode: ExecutionMode::Execute,
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn ledger(&self) -> &DynLedger {
        self.executor.ledger()
    }

    pub fn executor(&self) -> &FundingExecutor {
        &self.executor
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    pub async fn artifacts(&self) -> ProvisionResult<ArtifactSet> {
        Ok(self.store.read(&self.network).await?)
    }

    /// Compares a cached record with the live object. Read failures count
    /// as a missing object.
    pub async fn revalidate(
        &self,
        descriptor: &ResourceDescriptor,
        record: &ArtifactRecord,
    ) -> MatchOutcome {
        let label = Some(record.label.as_str());
        let feed_id = record.attribute(attrs::FEED_ID);

        let live = if matches_identity(descriptor, label, feed_id) {
            match self.ledger().get_object(record.object_id).await {
                Ok(resource) => Some(resource),
                Err(err) => {
                    tracing::warn!(
                        kind = %descriptor.kind(),
                        label = %descriptor.label(),
                        object_id = %record.object_id,
                        error = %err,
                        "could not read cached object"
                    );
                    None
                }
            }
        } else {
            None
        };

        let candidate = Candidate {
            label,
            feed_id,
            resource: live.as_ref(),
        };
        matches(descriptor, &candidate)
    }

    /// Reuses `existing` when it still matches, otherwise creates the
    /// resource and records it. Pass `None` to force creation.
    pub async fn ensure<P>(
        &self,
        provisioner: &P,
        existing: Option<&ArtifactRecord>,
    ) -> Result<Provisioned, ReconcileError>
    where
        P: Provisioner + ?Sized,
    {
        let descriptor = provisioner.descriptor();
        let kind = descriptor.kind();
        let label = descriptor.label();

        let outcome = match existing {
            None => Outcome::Created,
            Some(record) => match self.revalidate(descriptor, record).await {
                MatchOutcome::Matched => {
                    tracing::info!(%kind, %label, object_id = %record.object_id, "reusing cached resource");
                    return Ok(Provisioned {
                        record: record.clone(),
                        outcome: Outcome::Reused,
                        attempts: 0,
                    });
                }
                MatchOutcome::Mismatch(reason) => {
                    tracing::warn!(
                        %kind,
                        %label,
                        object_id = %record.object_id,
                        %reason,
                        "cached resource does not match, recreating"
                    );
                    Outcome::Recreated
                }
            },
        };

        let creation = provisioner
            .create(self)
            .await
            .map_err(|err| ReconcileError::new(kind, label, err))?;

        tracing::info!(
            %kind,
            %label,
            object_id = %creation.record.object_id,
            digest = creation.record.digest.as_deref().unwrap_or_default(),
            attempts = creation.attempts,
            dry_run = self.mode.is_dry_run(),
            "provisioned resource"
        );

        // A stale record found under another label must not outlive its
        // replacement.
        let superseded = existing
            .map(ArtifactRecord::key)
            .filter(|key| *key != creation.record.key());
        self.persist_replacing(creation.record.clone(), superseded)
            .await
            .map_err(|err| ReconcileError::new(kind, label, err).at(Stage::Persist))?;

        Ok(Provisioned {
            record: creation.record,
            outcome,
            attempts: creation.attempts,
        })
    }

    /// Merge-writes a record. Dry runs write nothing.
    pub async fn persist(&self, record: ArtifactRecord) -> ProvisionResult<()> {
        self.persist_replacing(record, None).await
    }

    async fn persist_replacing(
        &self,
        record: ArtifactRecord,
        superseded: Option<ArtifactKey>,
    ) -> ProvisionResult<()> {
        if self.mode.is_dry_run() {
            tracing::debug!(key = %record.key(), "dry run, not recording artifact");
            return Ok(());
        }
        let mut patch = ArtifactPatch::single(record);
        if let Some(key) = superseded {
            tracing::info!(%key, "dropping superseded artifact record");
            patch = patch.remove(key);
        }
        self.store.write(&self.network, patch).await?;
        Ok(())
    }
}

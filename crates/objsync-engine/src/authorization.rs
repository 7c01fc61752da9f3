//! Capability resolution.
//!
//! Order: explicit override, owned-object lookup, claim from the
//! capability store recorded when the package was published. Simulation
//! never claims.

use objsync_core::{
    CallArg, CapabilityHandle, ExecutionMode, MoveCall, ObjectId, TransactionPlan,
};
use serde::Serialize;

use crate::error::{ProvisionError, ProvisionResult};
use crate::executor::FundingExecutor;

/// Which capability to find and how to claim it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySpec {
    pub package_id: ObjectId,
    pub module: String,
    pub type_name: String,
    /// Entry function taking the shared store.
    pub claim_function: String,
}

impl CapabilitySpec {
    /// The AMM admin capability, claimed from `manager::AdminCapStore`.
    pub fn amm_admin(package_id: ObjectId) -> Self {
        Self {
            package_id,
            module: "manager".into(),
            type_name: "AMMAdminCap".into(),
            claim_function: "claim_admin_cap".into(),
        }
    }

    /// Fully qualified struct type.
    pub fn struct_type(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.type_name)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityRequest<'a> {
    pub spec: CapabilitySpec,
    pub explicit_id: Option<&'a str>,
    pub force_republish: bool,
    pub mode: ExecutionMode,
    /// Capability store recorded at publish time.
    pub store_id: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySource {
    Explicit,
    Owned,
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCapability {
    pub handle: CapabilityHandle,
    pub source: CapabilitySource,
    pub claim_digest: Option<String>,
}

/// Rejects an explicit capability combined with a republish: the old
/// capability cannot authorize a package that does not exist yet.
pub fn check_capability_conflict(
    explicit_id: Option<&str>,
    force_republish: bool,
) -> ProvisionResult<()> {
    if explicit_id.is_some() && force_republish {
        return Err(ProvisionError::conflict(
            "an explicit capability id cannot be combined with --re-publish",
        ));
    }
    Ok(())
}

pub struct CapabilityResolver<'a> {
    executor: &'a FundingExecutor,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(executor: &'a FundingExecutor) -> Self {
        Self { executor }
    }

    pub async fn resolve(&self, request: &CapabilityRequest<'_>) -> ProvisionResult<ResolvedCapability> {
        check_capability_conflict(request.explicit_id, request.force_republish)?;

        let owner = self.executor.address();
        let capability_type = request.spec.struct_type();

        if let Some(raw) = request.explicit_id {
            let object_id = ObjectId::parse(raw.trim())?;
            tracing::debug!(%object_id, "using explicit capability");
            return Ok(ResolvedCapability {
                handle: CapabilityHandle {
                    object_id,
                    owner,
                    granting_store_id: None,
                },
                source: CapabilitySource::Explicit,
                claim_digest: None,
            });
        }

        if let Some(object_id) = self.find_owned(&capability_type).await? {
            tracing::debug!(%object_id, capability_type = %capability_type, "found owned capability");
            return Ok(ResolvedCapability {
                handle: CapabilityHandle {
                    object_id,
                    owner,
                    granting_store_id: None,
                },
                source: CapabilitySource::Owned,
                claim_digest: None,
            });
        }

        if request.mode.is_dry_run() {
            return Err(ProvisionError::MissingCapability {
                capability_type,
                owner: owner.to_string(),
            });
        }

        let Some(store_id) = request.store_id else {
            return Err(ProvisionError::claim_failed(
                capability_type,
                "no capability store is recorded for this package",
            ));
        };

        tracing::info!(%store_id, capability_type = %capability_type, "claiming capability from store");
        let digest = self.claim(&request.spec, store_id).await?;

        match self.find_owned(&capability_type).await? {
            Some(object_id) => Ok(ResolvedCapability {
                handle: CapabilityHandle {
                    object_id,
                    owner,
                    granting_store_id: Some(store_id),
                },
                source: CapabilitySource::Claimed,
                claim_digest: Some(digest),
            }),
            None => Err(ProvisionError::claim_failed(
                capability_type,
                format!("claim transaction {digest} left no capability with {owner}"),
            )),
        }
    }

    async fn find_owned(&self, capability_type: &str) -> ProvisionResult<Option<ObjectId>> {
        let owned = self
            .executor
            .ledger()
            .get_owned_objects(self.executor.address(), capability_type)
            .await?;
        Ok(owned.first().map(|object| object.object_id))
    }

    async fn claim(&self, spec: &CapabilitySpec, store_id: ObjectId) -> ProvisionResult<String> {
        let ledger = self.executor.ledger();
        let capability_type = spec.struct_type();
        let capability_type = capability_type.as_str();

        let submitted = self
            .executor
            .submit_with_funding_retry(ExecutionMode::Execute, || async move {
                let store = ledger.get_object(store_id).await.map_err(|err| {
                    ProvisionError::claim_failed(capability_type, format!("store {store_id}: {err}"))
                })?;
                let shared = store.shared_ref(true).ok_or_else(|| {
                    ProvisionError::claim_failed(
                        capability_type,
                        format!("store {store_id} is not a shared object"),
                    )
                })?;

                let mut plan = TransactionPlan::new("claim-capability");
                plan.push(MoveCall::new(
                    spec.package_id,
                    spec.module.clone(),
                    spec.claim_function.clone(),
                    vec![CallArg::Shared(shared)],
                ));
                Ok(plan)
            })
            .await
            .map_err(|err| match err {
                ProvisionError::ClaimFailed { .. } => err,
                other => ProvisionError::claim_failed(capability_type, other.to_string()),
            })?;

        Ok(submitted.effects.digest)
    }
}

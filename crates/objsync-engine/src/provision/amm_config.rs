use async_trait::async_trait;
use objsync_core::{
    AMM_CONFIG_SUFFIX, CallArg, FEED_ID_LENGTH, MoveCall, ObjectId, ResourceDescriptor,
    ResourceKind, TransactionPlan, to_hex,
};
use objsync_storage::ArtifactRecord;

use super::attrs;
use crate::error::{ProvisionError, ProvisionResult};
use crate::reconciler::{Creation, Provisioner, Reconciler};

/// Parameters of `manager::create_amm_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmmConfigParams {
    pub base_spread_bps: u64,
    pub volatility_multiplier_bps: u64,
    pub use_laser: bool,
    pub feed_id: Vec<u8>,
}

/// Creates and shares an AMM config object.
pub struct AmmConfigProvisioner {
    descriptor: ResourceDescriptor,
    package_id: ObjectId,
    params: AmmConfigParams,
}

impl AmmConfigProvisioner {
    pub fn new(label: impl Into<String>, package_id: ObjectId, params: AmmConfigParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::config_object(label, package_id),
            package_id,
            params,
        }
    }
}

#[async_trait]
impl Provisioner for AmmConfigProvisioner {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    async fn create(&self, reconciler: &Reconciler) -> ProvisionResult<Creation> {
        if self.params.feed_id.len() != FEED_ID_LENGTH {
            return Err(ProvisionError::validation(format!(
                "feed id must be {FEED_ID_LENGTH} bytes, got {}",
                self.params.feed_id.len()
            )));
        }

        let submitted = reconciler
            .executor()
            .submit_with_funding_retry(reconciler.mode(), || async move {
                let mut plan = TransactionPlan::new("create-amm-config");
                let config = plan.push(MoveCall::new(
                    self.package_id,
                    "manager",
                    "create_amm_config",
                    vec![
                        CallArg::U64(self.params.base_spread_bps),
                        CallArg::U64(self.params.volatility_multiplier_bps),
                        CallArg::Bool(self.params.use_laser),
                        CallArg::Bytes(self.params.feed_id.clone()),
                    ],
                ));
                plan.push(MoveCall::new(
                    self.package_id,
                    "manager",
                    "share_amm_config",
                    vec![CallArg::Result(config)],
                ));
                Ok(plan)
            })
            .await?;
        let effects = submitted.effects;

        let created = effects.find_created(AMM_CONFIG_SUFFIX).ok_or_else(|| {
            ProvisionError::missing_created(AMM_CONFIG_SUFFIX, effects.digest.clone())
        })?;

        let mut record = ArtifactRecord::new(
            reconciler.network(),
            ResourceKind::ConfigObject,
            self.descriptor.label(),
            created.object_id,
        )
        .with_object_type(created.object_type.clone())
        .with_digest(effects.digest.clone())
        .with_attribute(attrs::PACKAGE_ID, self.package_id.to_string())
        .with_attribute(attrs::FEED_ID, to_hex(&self.params.feed_id));
        if let objsync_core::Owner::Shared {
            initial_shared_version,
        } = created.owner
        {
            record = record.with_attribute(
                attrs::INITIAL_SHARED_VERSION,
                initial_shared_version.to_string(),
            );
        }

        Ok(Creation {
            record,
            attempts: submitted.attempts,
        })
    }
}

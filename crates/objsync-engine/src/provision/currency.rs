use async_trait::async_trait;
use objsync_core::coin::{coin_object_type, currency_type, metadata_type, treasury_cap_type};
use objsync_core::{
    Address, CallArg, CoinSeed, MoveCall, ObjectId, ResourceDescriptor, ResourceKind,
    SUI_COIN_REGISTRY_ID, TransactionPlan,
};
use objsync_storage::ArtifactRecord;

use super::{attrs, roles};
use crate::error::{ProvisionError, ProvisionResult};
use crate::reconciler::{Creation, Provisioner, Reconciler};

/// Initializes a mock coin through the shared coin registry.
pub struct CurrencyProvisioner {
    descriptor: ResourceDescriptor,
    package_id: ObjectId,
    seed: CoinSeed,
    owner: Address,
}

impl CurrencyProvisioner {
    pub fn new(package_id: ObjectId, seed: CoinSeed, owner: Address) -> Self {
        Self {
            descriptor: ResourceDescriptor::currency(seed.label.clone(), seed.coin_type(package_id)),
            package_id,
            seed,
            owner,
        }
    }

    pub fn coin_type(&self) -> String {
        self.seed.coin_type(self.package_id)
    }
}

#[async_trait]
impl Provisioner for CurrencyProvisioner {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    async fn create(&self, reconciler: &Reconciler) -> ProvisionResult<Creation> {
        let ledger = reconciler.ledger();
        let label = self.descriptor.label();

        let submitted = reconciler
            .executor()
            .submit_with_funding_retry(reconciler.mode(), || async move {
                let registry = ledger.get_object(SUI_COIN_REGISTRY_ID).await?;
                let registry = registry
                    .shared_ref(true)
                    .ok_or_else(|| ProvisionError::validation("coin registry is not shared"))?;

                let mut plan = TransactionPlan::new(format!("init-coin-{label}"));
                plan.push(MoveCall::new(
                    self.package_id,
                    self.seed.module.clone(),
                    self.seed.init_function.clone(),
                    vec![CallArg::Shared(registry), CallArg::Address(self.owner)],
                ));
                Ok(plan)
            })
            .await?;
        let effects = submitted.effects;

        let coin_type = self.coin_type();
        let currency_suffix = currency_type(&coin_type);
        let currency_id = effects
            .first_created_id(&currency_suffix)
            .ok_or_else(|| ProvisionError::missing_created(currency_suffix.clone(), effects.digest.clone()))?;

        let record = ArtifactRecord::new(reconciler.network(), ResourceKind::Currency, label, currency_id)
            .with_object_type(format!("0x2{currency_suffix}"))
            .with_digest(effects.digest.clone())
            .with_attribute(attrs::COIN_TYPE, coin_type.clone())
            .with_attribute(attrs::PACKAGE_ID, self.package_id.to_string())
            .with_optional_auxiliary_id(
                roles::TREASURY_CAP,
                effects.first_created_id(&treasury_cap_type(&coin_type)),
            )
            .with_optional_auxiliary_id(roles::METADATA, effects.first_created_id(&metadata_type(&coin_type)))
            .with_optional_auxiliary_id(
                roles::MINTED_COIN,
                effects.first_created_id(&coin_object_type(&coin_type)),
            );

        Ok(Creation {
            record,
            attempts: submitted.attempts,
        })
    }
}

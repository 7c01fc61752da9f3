use async_trait::async_trait;
use objsync_core::{
    CallArg, LedgerClient, MoveCall, ObjectId, PRICE_INFO_OBJECT_SUFFIX, PriceFeedConfig,
    ResourceDescriptor, ResourceKind, SUI_CLOCK_ID, SharedObjectRef, TransactionPlan, to_hex,
};
use objsync_storage::ArtifactRecord;

use super::attrs;
use crate::error::{ProvisionError, ProvisionResult};
use crate::executor::Submitted;
use crate::reconciler::{Creation, Provisioner, Reconciler};

const MODULE: &str = "price_info";

/// Publishes a mock price info object for one configured feed.
pub struct PriceFeedProvisioner {
    descriptor: ResourceDescriptor,
    package_id: ObjectId,
    config: PriceFeedConfig,
}

impl PriceFeedProvisioner {
    pub fn new(package_id: ObjectId, config: PriceFeedConfig) -> Self {
        Self {
            descriptor: ResourceDescriptor::price_feed(
                config.label.clone(),
                config.feed_id.clone(),
                package_id,
            ),
            package_id,
            config,
        }
    }
}

#[async_trait]
impl Provisioner for PriceFeedProvisioner {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    async fn create(&self, reconciler: &Reconciler) -> ProvisionResult<Creation> {
        let feed_id = self.config.feed_id_bytes()?;
        let value = self.config.value()?;
        let ledger = reconciler.ledger();
        let label = self.descriptor.label();
        let feed_id = &feed_id;

        let submitted = reconciler
            .executor()
            .submit_with_funding_retry(reconciler.mode(), || async move {
                let clock = shared_ref(ledger.as_ref(), SUI_CLOCK_ID, false).await?;
                let mut plan = TransactionPlan::new(format!("publish-feed-{label}"));
                plan.push(MoveCall::new(
                    self.package_id,
                    MODULE,
                    "publish_price_feed",
                    vec![
                        CallArg::Bytes(feed_id.clone()),
                        CallArg::U64(value.magnitude),
                        CallArg::Bool(value.is_negative),
                        CallArg::U64(value.confidence),
                        CallArg::U64(value.exponent_magnitude),
                        CallArg::Bool(value.exponent_is_negative),
                        CallArg::Shared(clock),
                    ],
                ));
                Ok(plan)
            })
            .await?;
        let effects = submitted.effects;

        let created = effects.find_created(PRICE_INFO_OBJECT_SUFFIX).ok_or_else(|| {
            ProvisionError::missing_created(PRICE_INFO_OBJECT_SUFFIX, effects.digest.clone())
        })?;

        let record = ArtifactRecord::new(
            reconciler.network(),
            ResourceKind::PriceFeed,
            label,
            created.object_id,
        )
        .with_object_type(created.object_type.clone())
        .with_digest(effects.digest.clone())
        .with_attribute(attrs::FEED_ID, to_hex(feed_id))
        .with_attribute(attrs::PACKAGE_ID, self.package_id.to_string());

        Ok(Creation {
            record,
            attempts: submitted.attempts,
        })
    }
}

/// Pushes the configured values of every feed in one transaction.
///
/// Returns `None` when there is nothing to refresh.
pub async fn refresh_price_feeds(
    reconciler: &Reconciler,
    package_id: ObjectId,
    feeds: &[(PriceFeedConfig, ObjectId)],
) -> ProvisionResult<Option<Submitted>> {
    if feeds.is_empty() {
        return Ok(None);
    }

    let values = feeds
        .iter()
        .map(|(config, id)| Ok((config.value()?, *id)))
        .collect::<ProvisionResult<Vec<_>>>()?;
    let values = &values;
    let ledger = reconciler.ledger();

    let submitted = reconciler
        .executor()
        .submit_with_funding_retry(reconciler.mode(), || async move {
            let clock = shared_ref(ledger.as_ref(), SUI_CLOCK_ID, false).await?;
            let mut plan = TransactionPlan::new("refresh-price-feeds");
            for (value, id) in values {
                let target = shared_ref(ledger.as_ref(), *id, true).await?;
                plan.push(MoveCall::new(
                    package_id,
                    MODULE,
                    "update_price_feed",
                    vec![
                        CallArg::Shared(target),
                        CallArg::U64(value.magnitude),
                        CallArg::Bool(value.is_negative),
                        CallArg::U64(value.confidence),
                        CallArg::U64(value.exponent_magnitude),
                        CallArg::Bool(value.exponent_is_negative),
                        CallArg::Shared(clock),
                    ],
                ));
            }
            Ok(plan)
        })
        .await?;

    tracing::info!(
        feeds = feeds.len(),
        digest = %submitted.effects.digest,
        "refreshed price feeds"
    );
    Ok(Some(submitted))
}

/// Reads `id` and returns it as a shared transaction input.
pub(crate) async fn shared_ref(
    ledger: &dyn LedgerClient,
    id: ObjectId,
    mutable: bool,
) -> ProvisionResult<SharedObjectRef> {
    let object = ledger.get_object(id).await.map_err(|err| {
        if err.is_not_found() {
            ProvisionError::not_found("shared object", id)
        } else {
            err.into()
        }
    })?;
    object
        .shared_ref(mutable)
        .ok_or_else(|| ProvisionError::validation(format!("object {id} is not shared")))
}

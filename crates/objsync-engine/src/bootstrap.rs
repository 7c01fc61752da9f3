//! Localnet mock bootstrap.
//!
//! Publishes (or reuses) the mock Pyth and mock coin packages, ensures every
//! configured coin and price feed, then pushes current values to all feeds
//! in one transaction. Failures are isolated per resource: an independent
//! resource still runs, a dependent one is skipped.

use std::path::PathBuf;

use objsync_core::{
    Address, CallArg, CoinSeed, MoveCall, ObjectId, PackageBuilder, PriceFeedConfig, ResourceKind,
    SUI_FRAMEWORK_ID, TransactionPlan, identity_matches,
};
use objsync_storage::{ArtifactRecord, ArtifactSet};
use serde::Serialize;

use crate::amm::ResourceSummary;
use crate::error::{ProvisionError, ProvisionResult, ReconcileError, Stage};
use crate::packages::{PackageRequest, check_override_conflict, ensure_package};
use crate::provision::{CurrencyProvisioner, PriceFeedProvisioner, attrs, refresh_price_feeds, roles};
use crate::reconciler::Reconciler;

pub const PYTH_PACKAGE_LABEL: &str = "pyth-mock";
pub const COIN_PACKAGE_LABEL: &str = "coin-mock";

/// Share of a freshly minted balance sent to the buyer.
const BUYER_SHARE_DIVISOR: u64 = 4;

#[derive(Debug, Clone)]
pub struct MockSetupSettings {
    pub is_localnet: bool,
    pub pyth_path: PathBuf,
    pub coin_path: PathBuf,
    pub with_unpublished_dependencies: bool,
    pub feeds: Vec<PriceFeedConfig>,
    pub coins: Vec<CoinSeed>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSetupOptions {
    pub pyth_package_id: Option<String>,
    pub coin_package_id: Option<String>,
    pub re_publish: bool,
    pub buyer_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyerTransfer {
    pub coin_type: String,
    pub source_coin: ObjectId,
    pub amount: u64,
    pub recipient: Address,
    pub digest: String,
}

/// A resource that failed, flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub kind: ResourceKind,
    pub label: String,
    pub stage: Stage,
    pub category: String,
    pub message: String,
}

impl From<&ReconcileError> for FailureSummary {
    fn from(err: &ReconcileError) -> Self {
        Self {
            kind: err.kind,
            label: err.label.clone(),
            stage: err.stage,
            category: err.category().to_string(),
            message: err.source.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MockSetupReport {
    pub packages: Vec<ResourceSummary>,
    pub coins: Vec<ResourceSummary>,
    pub feeds: Vec<ResourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_digest: Option<String>,
    pub transfers: Vec<BuyerTransfer>,
    /// `kind/label` of resources skipped because a dependency failed.
    pub skipped: Vec<String>,
    pub failures: Vec<FailureSummary>,
}

impl MockSetupReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, err: ReconcileError) {
        tracing::error!(
            kind = %err.kind,
            label = %err.label,
            stage = %err.stage,
            error = %err.source,
            "resource failed"
        );
        self.failures.push(FailureSummary::from(&err));
    }

    fn skip(&mut self, kind: ResourceKind, label: &str) {
        tracing::warn!(%kind, %label, "skipped, a dependency failed");
        self.skipped.push(format!("{kind}/{label}"));
    }
}

/// Runs the bootstrap.
///
/// Returns `Err` only for problems that stop the whole run before any
/// resource is touched; per-resource failures land in the report.
pub async fn run_mock_setup(
    reconciler: &Reconciler,
    builder: &dyn PackageBuilder,
    settings: &MockSetupSettings,
    options: &MockSetupOptions,
) -> Result<MockSetupReport, ReconcileError> {
    let setup_error =
        |err: ProvisionError| ReconcileError::new(ResourceKind::Package, PYTH_PACKAGE_LABEL, err);

    if !settings.is_localnet {
        return Err(setup_error(ProvisionError::validation(format!(
            "mock setup only runs on localnet, not {}",
            reconciler.network()
        ))));
    }
    check_override_conflict(PYTH_PACKAGE_LABEL, options.pyth_package_id.as_deref(), options.re_publish)?;
    check_override_conflict(COIN_PACKAGE_LABEL, options.coin_package_id.as_deref(), options.re_publish)?;
    let buyer = options
        .buyer_address
        .as_deref()
        .map(|raw| ObjectId::parse(raw.trim()))
        .transpose()
        .map_err(|err| setup_error(err.into()))?;

    let artifacts = reconciler.artifacts().await.map_err(setup_error)?;
    let mut report = MockSetupReport::default();

    let pyth = package(reconciler, builder, &artifacts, settings, options, PYTH_PACKAGE_LABEL).await;
    let pyth = match pyth {
        Ok(provisioned) => {
            report.packages.push(ResourceSummary::from(&provisioned));
            Some(provisioned.record.object_id)
        }
        Err(err) => {
            report.fail(err);
            None
        }
    };

    let coin = package(reconciler, builder, &artifacts, settings, options, COIN_PACKAGE_LABEL).await;
    let coin = match coin {
        Ok(provisioned) => {
            report.packages.push(ResourceSummary::from(&provisioned));
            Some(provisioned.record.object_id)
        }
        Err(err) => {
            report.fail(err);
            None
        }
    };

    match coin {
        Some(package_id) => {
            for seed in &settings.coins {
                ensure_coin(reconciler, &artifacts, options, package_id, seed, buyer, &mut report).await;
            }
        }
        None => {
            for seed in &settings.coins {
                report.skip(ResourceKind::Currency, &seed.label);
            }
        }
    }

    match pyth {
        Some(package_id) => {
            let mut refresh = Vec::with_capacity(settings.feeds.len());
            for feed in &settings.feeds {
                let existing = if options.re_publish {
                    None
                } else {
                    find_feed_record(&artifacts, feed)
                };
                let provisioner = PriceFeedProvisioner::new(package_id, feed.clone());
                match reconciler.ensure(&provisioner, existing).await {
                    Ok(provisioned) => {
                        refresh.push((feed.clone(), provisioned.record.object_id));
                        report.feeds.push(ResourceSummary::from(&provisioned));
                    }
                    Err(err) => report.fail(err),
                }
            }

            match refresh_price_feeds(reconciler, package_id, &refresh).await {
                Ok(submitted) => report.refresh_digest = submitted.map(|s| s.effects.digest),
                Err(err) => report.fail(ReconcileError::new(ResourceKind::PriceFeed, "refresh", err)),
            }
        }
        None => {
            for feed in &settings.feeds {
                report.skip(ResourceKind::PriceFeed, &feed.label);
            }
        }
    }

    tracing::info!(
        packages = report.packages.len(),
        coins = report.coins.len(),
        feeds = report.feeds.len(),
        failures = report.failures.len(),
        skipped = report.skipped.len(),
        "mock setup finished"
    );
    Ok(report)
}

async fn package(
    reconciler: &Reconciler,
    builder: &dyn PackageBuilder,
    artifacts: &ArtifactSet,
    settings: &MockSetupSettings,
    options: &MockSetupOptions,
    label: &'static str,
) -> Result<crate::reconciler::Provisioned, ReconcileError> {
    let (path, override_id) = if label == PYTH_PACKAGE_LABEL {
        (settings.pyth_path.clone(), options.pyth_package_id.as_deref())
    } else {
        (settings.coin_path.clone(), options.coin_package_id.as_deref())
    };
    ensure_package(
        reconciler,
        builder,
        artifacts,
        PackageRequest {
            label,
            path,
            override_id,
            re_publish: options.re_publish,
            with_unpublished_dependencies: settings.with_unpublished_dependencies,
            tracked: Vec::new(),
        },
    )
    .await
}

async fn ensure_coin(
    reconciler: &Reconciler,
    artifacts: &ArtifactSet,
    options: &MockSetupOptions,
    package_id: ObjectId,
    seed: &CoinSeed,
    buyer: Option<Address>,
    report: &mut MockSetupReport,
) {
    let owner = reconciler.executor().address();
    let provisioner = CurrencyProvisioner::new(package_id, seed.clone(), owner);
    let coin_type = provisioner.coin_type();
    let existing = if options.re_publish {
        None
    } else {
        artifacts.get(ResourceKind::Currency, &seed.label)
    };

    let provisioned = match reconciler.ensure(&provisioner, existing).await {
        Ok(provisioned) => provisioned,
        Err(err) => {
            report.fail(err);
            return;
        }
    };
    report.coins.push(ResourceSummary::from(&provisioned));

    let Some(buyer) = buyer else { return };
    if !provisioned.outcome.is_new() {
        tracing::debug!(label = %seed.label, "coin was reused, no buyer transfer");
        return;
    }

    let minted = provisioned.record.auxiliary_id(roles::MINTED_COIN);
    match transfer_to_buyer(reconciler, &coin_type, minted, buyer).await {
        Ok(Some(transfer)) => report.transfers.push(transfer),
        Ok(None) => {}
        Err(err) => report.fail(ReconcileError::new(ResourceKind::Currency, seed.label.clone(), err)),
    }
}

/// Splits a quarter of the signer's coin off to `buyer`.
async fn transfer_to_buyer(
    reconciler: &Reconciler,
    coin_type: &str,
    preferred: Option<ObjectId>,
    buyer: Address,
) -> ProvisionResult<Option<BuyerTransfer>> {
    let owner = reconciler.executor().address();
    let coins = reconciler.ledger().get_coins(owner, coin_type).await?;
    let source = coins
        .iter()
        .find(|coin| Some(coin.object_id) == preferred)
        .or_else(|| coins.iter().max_by_key(|coin| coin.balance));

    let Some(source) = source else {
        tracing::warn!(%coin_type, %owner, "no coin to split for the buyer");
        return Ok(None);
    };
    let amount = source.balance / BUYER_SHARE_DIVISOR;
    if amount == 0 {
        tracing::warn!(%coin_type, balance = source.balance, "balance too small to split for the buyer");
        return Ok(None);
    }

    let source_coin = source.object_id;
    let submitted = reconciler
        .executor()
        .submit_with_funding_retry(reconciler.mode(), || async move {
            let mut plan = TransactionPlan::new("buyer-transfer");
            plan.push(
                MoveCall::new(
                    SUI_FRAMEWORK_ID,
                    "pay",
                    "split_and_transfer",
                    vec![
                        CallArg::Object(source_coin),
                        CallArg::U64(amount),
                        CallArg::Address(buyer),
                    ],
                )
                .with_type_arguments(vec![coin_type.to_string()]),
            );
            Ok(plan)
        })
        .await?;

    tracing::info!(
        %coin_type,
        %buyer,
        amount,
        digest = %submitted.effects.digest,
        "transferred coins to buyer"
    );

    Ok(Some(BuyerTransfer {
        coin_type: coin_type.to_string(),
        source_coin,
        amount,
        recipient: buyer,
        digest: submitted.effects.digest,
    }))
}

/// The record for `feed`: by label, else any feed record carrying the same
/// feed id.
fn find_feed_record<'a>(artifacts: &'a ArtifactSet, feed: &PriceFeedConfig) -> Option<&'a ArtifactRecord> {
    artifacts
        .get(ResourceKind::PriceFeed, &feed.label)
        .or_else(|| {
            artifacts.of_kind(ResourceKind::PriceFeed).find(|record| {
                identity_matches(&feed.label, &feed.feed_id, None, record.attribute(attrs::FEED_ID))
            })
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use objsync_db_memory::InMemoryArtifactStore;
    use objsync_storage::DynArtifactStore;

    use super::*;
    use crate::executor::FundingExecutor;
    use crate::reconciler::Outcome;
    use crate::retry::RetryPolicy;
    use crate::testing::{FakeBuilder, FakeLedger, FakeSigner, MINTED_BALANCE};

    const SIGNER: Address = ObjectId::short(0xa1);
    const BUYER: &str = "0xb0b";

    fn settings() -> MockSetupSettings {
        MockSetupSettings {
            is_localnet: true,
            pyth_path: PathBuf::from("move/pyth-mock"),
            coin_path: PathBuf::from("move/coin-mock"),
            with_unpublished_dependencies: true,
            feeds: vec![PriceFeedConfig::mock_sui()],
            coins: vec![CoinSeed::local_mock_usd()],
        }
    }

    fn harness() -> (Arc<FakeLedger>, DynArtifactStore, Reconciler) {
        let ledger = Arc::new(FakeLedger::new());
        let store: DynArtifactStore = Arc::new(InMemoryArtifactStore::new());
        let executor = FundingExecutor::new(
            ledger.clone(),
            Arc::new(FakeSigner::new(SIGNER)),
            RetryPolicy::new(3, Duration::ZERO),
        );
        let reconciler = Reconciler::new(store.clone(), executor, "localnet");
        (ledger, store, reconciler)
    }

    fn with_buyer() -> MockSetupOptions {
        MockSetupOptions {
            buyer_address: Some(BUYER.into()),
            ..MockSetupOptions::default()
        }
    }

    #[tokio::test]
    async fn test_first_run_provisions_everything() {
        let (ledger, store, rc) = harness();

        let report = run_mock_setup(&rc, &FakeBuilder::new(), &settings(), &with_buyer())
            .await
            .unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.packages.len(), 2);
        assert_eq!(report.coins[0].outcome, Outcome::Created);
        assert_eq!(report.feeds[0].outcome, Outcome::Created);
        assert!(report.refresh_digest.is_some());

        let transfers = ledger.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, MINTED_BALANCE / 4);
        assert_eq!(transfers[0].recipient, ObjectId::parse(BUYER).unwrap());

        let artifacts = store.read("localnet").await.unwrap();
        let currency = artifacts.get(ResourceKind::Currency, "LocalMockUsd").unwrap();
        assert!(currency.auxiliary_id(roles::TREASURY_CAP).is_some());
        assert!(currency.auxiliary_id(roles::METADATA).is_some());
        assert_eq!(currency.auxiliary_id(roles::MINTED_COIN), Some(transfers[0].source_coin));
        let feed = artifacts.get(ResourceKind::PriceFeed, "MOCK_SUI_FEED").unwrap();
        assert_eq!(
            feed.attribute(attrs::FEED_ID),
            Some(objsync_core::DEFAULT_FEED_ID)
        );
    }

    #[tokio::test]
    async fn test_second_run_only_refreshes() {
        let (ledger, _store, rc) = harness();
        let builder = FakeBuilder::new();
        let first = run_mock_setup(&rc, &builder, &settings(), &with_buyer()).await.unwrap();
        let transactions = ledger.transaction_count();

        let second = run_mock_setup(&rc, &builder, &settings(), &with_buyer()).await.unwrap();

        assert!(second.is_success());
        assert!(second.packages.iter().all(|p| p.outcome == Outcome::Reused));
        assert_eq!(second.coins[0].object_id, first.coins[0].object_id);
        assert_eq!(second.feeds[0].object_id, first.feeds[0].object_id);
        assert!(second.transfers.is_empty());
        assert_eq!(ledger.transaction_count(), transactions + 1);
        assert_eq!(builder.build_count(), 2);
    }

    #[tokio::test]
    async fn test_recreated_feed_drops_record_under_old_label() {
        let (ledger, store, rc) = harness();
        let builder = FakeBuilder::new();
        run_mock_setup(&rc, &builder, &settings(), &MockSetupOptions::default())
            .await
            .unwrap();

        let current = store
            .read("localnet")
            .await
            .unwrap()
            .get(ResourceKind::PriceFeed, "MOCK_SUI_FEED")
            .cloned()
            .unwrap();
        let mut renamed = current.clone();
        renamed.label = "OLD_SUI_FEED".into();
        store
            .write(
                "localnet",
                objsync_storage::ArtifactPatch::single(renamed).remove(current.key()),
            )
            .await
            .unwrap();
        ledger.remove_object(current.object_id);

        let report = run_mock_setup(&rc, &builder, &settings(), &MockSetupOptions::default())
            .await
            .unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.feeds[0].outcome, Outcome::Recreated);
        let artifacts = store.read("localnet").await.unwrap();
        assert!(artifacts.get(ResourceKind::PriceFeed, "OLD_SUI_FEED").is_none());
        let feed = artifacts.get(ResourceKind::PriceFeed, "MOCK_SUI_FEED").unwrap();
        assert_eq!(feed.object_id, report.feeds[0].object_id);
        assert_ne!(feed.object_id, current.object_id);
        assert_eq!(artifacts.of_kind(ResourceKind::PriceFeed).count(), 1);
    }

    #[tokio::test]
    async fn test_republish_ignores_artifacts() {
        let (_ledger, _store, rc) = harness();
        let builder = FakeBuilder::new();
        let first = run_mock_setup(&rc, &builder, &settings(), &MockSetupOptions::default())
            .await
            .unwrap();

        let options = MockSetupOptions {
            re_publish: true,
            ..MockSetupOptions::default()
        };
        let second = run_mock_setup(&rc, &builder, &settings(), &options).await.unwrap();

        assert_eq!(builder.build_count(), 4);
        assert!(second.packages.iter().all(|p| p.outcome == Outcome::Created));
        assert_ne!(second.feeds[0].object_id, first.feeds[0].object_id);
    }

    #[tokio::test]
    async fn test_failed_package_skips_dependents_only() {
        let (ledger, _store, rc) = harness();
        let options = MockSetupOptions {
            pyth_package_id: Some("0xdead".into()),
            ..MockSetupOptions::default()
        };

        let report = run_mock_setup(&rc, &FakeBuilder::new(), &settings(), &options)
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures[0].kind, ResourceKind::Package);
        assert_eq!(report.failures[0].label, PYTH_PACKAGE_LABEL);
        assert_eq!(report.skipped, vec!["price_feed/MOCK_SUI_FEED".to_string()]);
        assert_eq!(report.coins.len(), 1);
        assert!(report.feeds.is_empty());
        assert_eq!(ledger.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_before_touching_the_ledger() {
        let (ledger, _store, rc) = harness();

        let remote = MockSetupSettings {
            is_localnet: false,
            ..settings()
        };
        let err = run_mock_setup(&rc, &FakeBuilder::new(), &remote, &MockSetupOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.source, ProvisionError::Validation { .. }));

        let conflicting = MockSetupOptions {
            coin_package_id: Some("0xc0".into()),
            re_publish: true,
            ..MockSetupOptions::default()
        };
        let err = run_mock_setup(&rc, &FakeBuilder::new(), &settings(), &conflicting)
            .await
            .unwrap_err();
        assert!(matches!(err.source, ProvisionError::Conflict { .. }));
        assert_eq!(err.label, COIN_PACKAGE_LABEL);

        assert_eq!(ledger.transaction_count(), 0);
    }
}

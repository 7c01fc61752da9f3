//! AMM workflows: seed, create, update and view of `manager::AMMConfig`.
//!
//! Updates are partial patches over the full-replace `update_amm_config`
//! entry point: every omitted value defaults to what is currently on-chain.

use std::cmp::Reverse;
use std::path::PathBuf;

use objsync_core::{
    AMM_CONFIG_SUFFIX, CallArg, DiscoveredResource, ExecutionMode, FEED_ID_LENGTH, MoveCall,
    ObjectId, Owner, PriceFeedConfig, ResourceDescriptor, ResourceKind, TransactionPlan,
    encode_fixed_hex, find_feed_config, to_hex,
};
use objsync_storage::{ArtifactRecord, ArtifactSet};
use serde::Serialize;

use crate::authorization::{
    CapabilityRequest, CapabilityResolver, CapabilitySource, CapabilitySpec, ResolvedCapability,
    check_capability_conflict,
};
use crate::error::{ProvisionError, ProvisionResult, ReconcileError, Stage};
use crate::packages::{PackageRequest, ensure_package};
use crate::provision::{AmmConfigParams, AmmConfigProvisioner, attrs, roles, shared_ref};
use crate::reconciler::{Outcome, Provisioned, Reconciler};

/// Artifact label of the AMM package.
pub const AMM_PACKAGE_LABEL: &str = "amm";
/// Artifact label used for configs created without an explicit label.
pub const DEFAULT_CONFIG_LABEL: &str = "amm-config";

const ADMIN_CAP_STORE_SUFFIX: &str = "::manager::AdminCapStore";

/// Network-level AMM settings, usually taken from configuration.
#[derive(Debug, Clone)]
pub struct AmmSettings {
    pub package_path: PathBuf,
    pub is_localnet: bool,
    pub with_unpublished_dependencies: bool,
    pub base_spread_bps: u64,
    pub volatility_multiplier_bps: u64,
    pub use_laser: bool,
    /// Feed label used when neither an id nor a label is given.
    pub feed_label: String,
    pub feeds: Vec<PriceFeedConfig>,
}

/// How the caller picked a price feed.
#[derive(Debug, Clone, Default)]
pub struct FeedSelector {
    pub feed_id: Option<String>,
    pub feed_label: Option<String>,
}

impl FeedSelector {
    pub fn is_empty(&self) -> bool {
        self.feed_id.is_none() && self.feed_label.is_none()
    }
}

/// Resolves the 32-byte feed id for a new or updated config.
///
/// An explicit id always wins. Elsewhere than localnet an explicit id is
/// required. On localnet the recorded price feed with the requested label
/// is used, then the configured feed with that label.
pub fn resolve_feed_id(
    selector: &FeedSelector,
    settings: &AmmSettings,
    artifacts: &ArtifactSet,
) -> ProvisionResult<Vec<u8>> {
    if let Some(raw) = selector.feed_id.as_deref() {
        return Ok(encode_fixed_hex(raw, FEED_ID_LENGTH)?);
    }

    if !settings.is_localnet {
        return Err(ProvisionError::validation(
            "an explicit --feed-id is required outside localnet",
        ));
    }

    let label = selector
        .feed_label
        .as_deref()
        .unwrap_or(settings.feed_label.as_str());

    if let Some(feed_id) = artifacts
        .get(ResourceKind::PriceFeed, label)
        .and_then(|record| record.attribute(attrs::FEED_ID))
    {
        tracing::debug!(%label, %feed_id, "using recorded price feed");
        return Ok(encode_fixed_hex(feed_id, FEED_ID_LENGTH)?);
    }

    match find_feed_config(&settings.feeds, Some(label), None) {
        Some(config) => {
            tracing::warn!(
                %label,
                feed_id = %config.feed_id,
                "no price feed recorded for label, using the configured feed id"
            );
            Ok(config.feed_id_bytes()?)
        }
        None => Err(ProvisionError::validation(format!(
            "no price feed named {label:?} is recorded or configured; pass --feed-id"
        ))),
    }
}

/// Parses a strictly positive integer.
pub fn parse_positive_u64(raw: &str, field: &str) -> ProvisionResult<u64> {
    match parse_non_negative_u64(raw, field)? {
        0 => Err(ProvisionError::validation(format!(
            "{field} must be greater than zero"
        ))),
        value => Ok(value),
    }
}

/// Parses an unsigned integer that fits in 64 bits.
pub fn parse_non_negative_u64(raw: &str, field: &str) -> ProvisionResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        ProvisionError::validation(format!(
            "{field} must be a non-negative integer below 2^64, got {raw:?}"
        ))
    })
}

/// Writable values of an AMM config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmmConfigValues {
    pub base_spread_bps: u64,
    pub volatility_multiplier_bps: u64,
    pub use_laser: bool,
    pub trading_paused: bool,
    pub pyth_price_feed_id: String,
}

/// Decoded on-chain view of an AMM config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmmConfigOverview {
    pub config_id: ObjectId,
    pub object_type: String,
    pub version: u64,
    pub initial_shared_version: Option<u64>,
    #[serde(flatten)]
    pub values: AmmConfigValues,
}

impl AmmConfigOverview {
    pub fn from_resource(resource: &DiscoveredResource) -> ProvisionResult<Self> {
        let fields = &resource.fields;
        let initial_shared_version = match resource.owner {
            Owner::Shared {
                initial_shared_version,
            } => Some(initial_shared_version),
            _ => None,
        };

        Ok(Self {
            config_id: resource.object_id,
            object_type: resource.object_type.clone(),
            version: resource.version,
            initial_shared_version,
            values: AmmConfigValues {
                base_spread_bps: fields.require_u64("base_spread_bps")?,
                volatility_multiplier_bps: fields.require_u64("volatility_multiplier_bps")?,
                use_laser: fields.require_bool("use_laser")?,
                trading_paused: fields.require_bool("trading_paused")?,
                pyth_price_feed_id: to_hex(&fields.require_bytes("pyth_price_feed_id")?),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilitySummary {
    pub object_id: ObjectId,
    pub source: CapabilitySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_digest: Option<String>,
}

impl From<&ResolvedCapability> for CapabilitySummary {
    fn from(resolved: &ResolvedCapability) -> Self {
        Self {
            object_id: resolved.handle.object_id,
            source: resolved.source,
            claim_digest: resolved.claim_digest.clone(),
        }
    }
}

/// One resource touched by a workflow.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub kind: ResourceKind,
    pub label: String,
    pub object_id: ObjectId,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl From<&Provisioned> for ResourceSummary {
    fn from(provisioned: &Provisioned) -> Self {
        let record = &provisioned.record;
        Self {
            kind: record.kind,
            label: record.label.clone(),
            object_id: record.object_id,
            outcome: provisioned.outcome,
            digest: record.digest.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    pub package_id: Option<String>,
    pub re_publish: bool,
    pub admin_cap_id: Option<String>,
    pub feed: FeedSelector,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub package: ResourceSummary,
    pub config: ResourceSummary,
    /// Not resolved in dry runs.
    pub admin_cap: Option<CapabilitySummary>,
    pub dry_run: bool,
}

/// Ensures the AMM package, a config object for it, and the admin
/// capability of the signer.
pub async fn seed(
    reconciler: &Reconciler,
    builder: &dyn objsync_core::PackageBuilder,
    settings: &AmmSettings,
    options: &SeedOptions,
) -> Result<SeedReport, ReconcileError> {
    let package_error =
        |err: ProvisionError| ReconcileError::new(ResourceKind::Package, AMM_PACKAGE_LABEL, err);

    check_capability_conflict(options.admin_cap_id.as_deref(), options.re_publish)
        .map_err(|err| package_error(err).at(Stage::Authorize))?;

    let artifacts = reconciler.artifacts().await.map_err(package_error)?;
    let package = ensure_package(
        reconciler,
        builder,
        &artifacts,
        PackageRequest {
            label: AMM_PACKAGE_LABEL,
            path: settings.package_path.clone(),
            override_id: options.package_id.as_deref(),
            re_publish: options.re_publish,
            with_unpublished_dependencies: settings.with_unpublished_dependencies,
            tracked: vec![(roles::ADMIN_CAP_STORE, ADMIN_CAP_STORE_SUFFIX.to_string())],
        },
    )
    .await?;
    let package_id = package.record.object_id;

    let config = ensure_seed_config(reconciler, settings, &artifacts, package_id, options).await?;

    let admin_cap = if reconciler.mode().is_dry_run() {
        None
    } else {
        let resolved = CapabilityResolver::new(reconciler.executor())
            .resolve(&CapabilityRequest {
                spec: CapabilitySpec::amm_admin(package_id),
                explicit_id: options.admin_cap_id.as_deref(),
                force_republish: options.re_publish,
                mode: reconciler.mode(),
                store_id: package.record.auxiliary_id(roles::ADMIN_CAP_STORE),
            })
            .await
            .map_err(package_error)?;

        let record = ArtifactRecord::new(
            reconciler.network(),
            ResourceKind::Package,
            AMM_PACKAGE_LABEL,
            package_id,
        )
        .with_auxiliary_id(roles::ADMIN_CAP, resolved.handle.object_id);
        reconciler
            .persist(record)
            .await
            .map_err(|err| package_error(err).at(Stage::Persist))?;
        Some(CapabilitySummary::from(&resolved))
    };

    Ok(SeedReport {
        package: ResourceSummary::from(&package),
        config: ResourceSummary::from(&config),
        admin_cap,
        dry_run: reconciler.mode().is_dry_run(),
    })
}

/// Reuses the most recent config recorded for `package_id` that still
/// exists, else creates one.
async fn ensure_seed_config(
    reconciler: &Reconciler,
    settings: &AmmSettings,
    artifacts: &ArtifactSet,
    package_id: ObjectId,
    options: &SeedOptions,
) -> Result<Provisioned, ReconcileError> {
    let package = package_id.to_string();

    if !options.re_publish {
        let mut recorded: Vec<&ArtifactRecord> = artifacts
            .of_kind(ResourceKind::ConfigObject)
            .filter(|record| record.attribute(attrs::PACKAGE_ID) == Some(package.as_str()))
            .collect();
        recorded.sort_by_key(|record| Reverse(record.updated_at));

        for record in recorded {
            let descriptor = ResourceDescriptor::config_object(record.label.clone(), package_id);
            if reconciler.revalidate(&descriptor, record).await.is_matched() {
                tracing::info!(label = %record.label, object_id = %record.object_id, "reusing AMM config");
                return Ok(Provisioned {
                    record: record.clone(),
                    outcome: Outcome::Reused,
                    attempts: 0,
                });
            }
        }
    }

    let config_error = |err: ProvisionError| {
        ReconcileError::new(ResourceKind::ConfigObject, DEFAULT_CONFIG_LABEL, err)
    };
    let feed_id = resolve_feed_id(&options.feed, settings, artifacts).map_err(config_error)?;
    let provisioner = AmmConfigProvisioner::new(
        DEFAULT_CONFIG_LABEL,
        package_id,
        AmmConfigParams {
            base_spread_bps: settings.base_spread_bps,
            volatility_multiplier_bps: settings.volatility_multiplier_bps,
            use_laser: settings.use_laser,
            feed_id,
        },
    );

    let existing = if options.re_publish {
        None
    } else {
        artifacts.get(ResourceKind::ConfigObject, DEFAULT_CONFIG_LABEL)
    };
    reconciler.ensure(&provisioner, existing).await
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub package_id: Option<String>,
    pub label: Option<String>,
    pub base_spread_bps: Option<String>,
    pub volatility_multiplier_bps: Option<String>,
    pub use_laser: Option<bool>,
    pub feed: FeedSelector,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub package_id: ObjectId,
    pub config: ResourceSummary,
    pub base_spread_bps: u64,
    pub volatility_multiplier_bps: u64,
    pub use_laser: bool,
    pub pyth_price_feed_id: String,
    pub attempts: u32,
    pub dry_run: bool,
}

/// Creates and shares a new config object.
pub async fn create(
    reconciler: &Reconciler,
    settings: &AmmSettings,
    options: &CreateOptions,
) -> Result<CreateReport, ReconcileError> {
    let label = options.label.as_deref().unwrap_or(DEFAULT_CONFIG_LABEL);
    let fail = |err: ProvisionError| ReconcileError::new(ResourceKind::ConfigObject, label, err);

    let base_spread_bps = match options.base_spread_bps.as_deref() {
        Some(raw) => parse_positive_u64(raw, "base spread bps").map_err(fail)?,
        None => settings.base_spread_bps,
    };
    let volatility_multiplier_bps = match options.volatility_multiplier_bps.as_deref() {
        Some(raw) => parse_non_negative_u64(raw, "volatility multiplier bps").map_err(fail)?,
        None => settings.volatility_multiplier_bps,
    };
    let use_laser = options.use_laser.unwrap_or(settings.use_laser);

    let artifacts = reconciler.artifacts().await.map_err(fail)?;
    let package_id = resolve_amm_package(reconciler, &artifacts, options.package_id.as_deref())
        .await
        .map_err(fail)?;
    let feed_id = resolve_feed_id(&options.feed, settings, &artifacts).map_err(fail)?;
    let pyth_price_feed_id = to_hex(&feed_id);

    let provisioner = AmmConfigProvisioner::new(
        label,
        package_id,
        AmmConfigParams {
            base_spread_bps,
            volatility_multiplier_bps,
            use_laser,
            feed_id,
        },
    );
    let provisioned = reconciler.ensure(&provisioner, None).await?;

    Ok(CreateReport {
        package_id,
        config: ResourceSummary::from(&provisioned),
        base_spread_bps,
        volatility_multiplier_bps,
        use_laser,
        pyth_price_feed_id,
        attempts: provisioned.attempts,
        dry_run: reconciler.mode().is_dry_run(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub package_id: Option<String>,
    pub config_id: Option<String>,
    pub admin_cap_id: Option<String>,
    pub base_spread_bps: Option<String>,
    pub volatility_multiplier_bps: Option<String>,
    pub use_laser: Option<bool>,
    pub trading_paused: Option<bool>,
    pub feed: FeedSelector,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub package_id: ObjectId,
    pub config_id: ObjectId,
    pub before: AmmConfigOverview,
    pub requested: AmmConfigValues,
    /// Re-read after execution; absent in dry runs.
    pub after: Option<AmmConfigOverview>,
    pub capability: CapabilitySummary,
    pub digest: String,
    pub attempts: u32,
    pub dry_run: bool,
}

/// Patches an existing config.
pub async fn update(
    reconciler: &Reconciler,
    settings: &AmmSettings,
    options: &UpdateOptions,
) -> Result<UpdateReport, ReconcileError> {
    let label = options.config_id.as_deref().unwrap_or(DEFAULT_CONFIG_LABEL);
    let fail = |err: ProvisionError| ReconcileError::new(ResourceKind::ConfigObject, label, err);

    let base_spread_bps = options
        .base_spread_bps
        .as_deref()
        .map(|raw| parse_positive_u64(raw, "base spread bps"))
        .transpose()
        .map_err(fail)?;
    let volatility_multiplier_bps = options
        .volatility_multiplier_bps
        .as_deref()
        .map(|raw| parse_non_negative_u64(raw, "volatility multiplier bps"))
        .transpose()
        .map_err(fail)?;

    let artifacts = reconciler.artifacts().await.map_err(fail)?;
    let target = resolve_target(
        reconciler,
        &artifacts,
        options.package_id.as_deref(),
        options.config_id.as_deref(),
    )
    .await
    .map_err(fail)?;
    let label = target
        .record
        .as_ref()
        .map_or(label, |record| record.label.as_str());
    let fail = |err: ProvisionError| ReconcileError::new(ResourceKind::ConfigObject, label, err);

    let before = target.overview.clone();
    let feed_id = if options.feed.is_empty() {
        encode_fixed_hex(&before.values.pyth_price_feed_id, FEED_ID_LENGTH).map_err(|e| fail(e.into()))?
    } else {
        resolve_feed_id(&options.feed, settings, &artifacts).map_err(fail)?
    };
    let requested = AmmConfigValues {
        base_spread_bps: base_spread_bps.unwrap_or(before.values.base_spread_bps),
        volatility_multiplier_bps: volatility_multiplier_bps
            .unwrap_or(before.values.volatility_multiplier_bps),
        use_laser: options.use_laser.unwrap_or(before.values.use_laser),
        trading_paused: options.trading_paused.unwrap_or(before.values.trading_paused),
        pyth_price_feed_id: to_hex(&feed_id),
    };

    let store_id = artifacts
        .get(ResourceKind::Package, AMM_PACKAGE_LABEL)
        .filter(|record| record.object_id == target.package_id)
        .and_then(|record| record.auxiliary_id(roles::ADMIN_CAP_STORE));
    let capability = CapabilityResolver::new(reconciler.executor())
        .resolve(&CapabilityRequest {
            spec: CapabilitySpec::amm_admin(target.package_id),
            explicit_id: options.admin_cap_id.as_deref(),
            force_republish: false,
            mode: reconciler.mode(),
            store_id,
        })
        .await
        .map_err(fail)?;

    let ledger = reconciler.ledger();
    let package_id = target.package_id;
    let config_id = target.config_id;
    let cap_id = capability.handle.object_id;
    let values = &requested;
    let feed_id = &feed_id;

    let submitted = reconciler
        .executor()
        .submit_with_funding_retry(reconciler.mode(), || async move {
            let config = shared_ref(ledger.as_ref(), config_id, true).await?;
            let mut plan = TransactionPlan::new("update-amm-config");
            plan.push(MoveCall::new(
                package_id,
                "manager",
                "update_amm_config",
                vec![
                    CallArg::Shared(config),
                    CallArg::Object(cap_id),
                    CallArg::U64(values.base_spread_bps),
                    CallArg::U64(values.volatility_multiplier_bps),
                    CallArg::Bool(values.use_laser),
                    CallArg::Bool(values.trading_paused),
                    CallArg::Bytes(feed_id.clone()),
                ],
            ));
            Ok(plan)
        })
        .await
        .map_err(fail)?;

    let after = if reconciler.mode().is_dry_run() {
        None
    } else {
        let live = ledger
            .get_object(config_id)
            .await
            .map_err(|err| fail(err.into()))?;
        let overview = AmmConfigOverview::from_resource(&live).map_err(fail)?;

        match &target.record {
            Some(record) => {
                let updated = ArtifactRecord::new(
                    reconciler.network(),
                    ResourceKind::ConfigObject,
                    record.label.clone(),
                    config_id,
                )
                .with_digest(submitted.effects.digest.clone())
                .with_attribute(attrs::FEED_ID, overview.values.pyth_price_feed_id.clone());
                reconciler
                    .persist(updated)
                    .await
                    .map_err(|err| fail(err).at(Stage::Persist))?;
            }
            None => tracing::debug!(%config_id, "config is not recorded, leaving artifacts unchanged"),
        }
        Some(overview)
    };

    tracing::info!(
        %config_id,
        digest = %submitted.effects.digest,
        attempts = submitted.attempts,
        dry_run = reconciler.mode().is_dry_run(),
        "updated AMM config"
    );

    Ok(UpdateReport {
        package_id,
        config_id,
        before,
        requested,
        after,
        capability: CapabilitySummary::from(&capability),
        digest: submitted.effects.digest,
        attempts: submitted.attempts,
        dry_run: reconciler.mode().is_dry_run(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub package_id: Option<String>,
    pub config_id: Option<String>,
}

/// Reads and decodes a config.
pub async fn view(
    reconciler: &Reconciler,
    options: &ViewOptions,
) -> Result<AmmConfigOverview, ReconcileError> {
    let label = options.config_id.as_deref().unwrap_or(DEFAULT_CONFIG_LABEL);
    let fail = |err: ProvisionError| ReconcileError::new(ResourceKind::ConfigObject, label, err);

    let artifacts = reconciler.artifacts().await.map_err(fail)?;
    let target = resolve_target(
        reconciler,
        &artifacts,
        options.package_id.as_deref(),
        options.config_id.as_deref(),
    )
    .await
    .map_err(fail)?;
    Ok(target.overview)
}

struct Target {
    package_id: ObjectId,
    config_id: ObjectId,
    record: Option<ArtifactRecord>,
    overview: AmmConfigOverview,
}

/// Finds the config to operate on: the explicit id, else the latest config
/// recorded for the AMM package.
async fn resolve_target(
    reconciler: &Reconciler,
    artifacts: &ArtifactSet,
    package_id: Option<&str>,
    config_id: Option<&str>,
) -> ProvisionResult<Target> {
    let (config_id, record, live) = match config_id {
        Some(raw) => {
            let config_id = ObjectId::parse(raw.trim())?;
            let record = artifacts
                .of_kind(ResourceKind::ConfigObject)
                .find(|record| record.object_id == config_id)
                .cloned();
            (config_id, record, read_config(reconciler, config_id).await?)
        }
        None => {
            let package_id = resolve_amm_package(reconciler, artifacts, package_id).await?;
            let package = package_id.to_string();
            let record = artifacts
                .latest(ResourceKind::ConfigObject, |record| {
                    record.attribute(attrs::PACKAGE_ID) == Some(package.as_str())
                })
                .cloned()
                .ok_or_else(|| {
                    ProvisionError::validation(format!(
                        "no AMM config is recorded for package {package_id}; pass --config-id or run `amm create`"
                    ))
                })?;
            let live = read_config(reconciler, record.object_id).await?;
            (record.object_id, Some(record), live)
        }
    };

    let package_id = match package_id {
        Some(raw) => ObjectId::parse(raw.trim())?,
        None => live.type_package_id().ok_or_else(|| {
            ProvisionError::validation(format!(
                "cannot derive the package of {config_id} from type {}",
                live.object_type
            ))
        })?,
    };

    let expected = format!("{package_id}{AMM_CONFIG_SUFFIX}");
    if !live.type_contains(&expected) {
        return Err(ProvisionError::validation(format!(
            "object {config_id} has type {}, expected {expected}",
            live.object_type
        )));
    }

    Ok(Target {
        package_id,
        config_id,
        record,
        overview: AmmConfigOverview::from_resource(&live)?,
    })
}

async fn read_config(reconciler: &Reconciler, config_id: ObjectId) -> ProvisionResult<DiscoveredResource> {
    reconciler
        .ledger()
        .get_object(config_id)
        .await
        .map_err(|err| {
            if err.is_not_found() {
                ProvisionError::not_found("AMM config", config_id)
            } else {
                err.into()
            }
        })
}

/// The explicit package (which must exist), else the recorded one.
async fn resolve_amm_package(
    reconciler: &Reconciler,
    artifacts: &ArtifactSet,
    explicit: Option<&str>,
) -> ProvisionResult<ObjectId> {
    if let Some(raw) = explicit {
        let package_id = ObjectId::parse(raw.trim())?;
        let package = reconciler
            .ledger()
            .get_object(package_id)
            .await
            .map_err(|_| ProvisionError::not_found("AMM package", package_id))?;
        if !package.is_package {
            return Err(ProvisionError::validation(format!(
                "{package_id} is not a package"
            )));
        }
        return Ok(package_id);
    }

    artifacts
        .get(ResourceKind::Package, AMM_PACKAGE_LABEL)
        .map(|record| record.object_id)
        .ok_or_else(|| {
            ProvisionError::validation(format!(
                "no AMM package is recorded for network {}; run `amm seed` or pass --package-id",
                reconciler.network()
            ))
        })
}

/// Dry-run mode shortcut for callers that only carry a flag.
pub fn mode_for(dry_run: bool) -> ExecutionMode {
    if dry_run {
        ExecutionMode::DryRun
    } else {
        ExecutionMode::Execute
    }
}

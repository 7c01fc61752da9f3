//! Package resolution shared by the mock bootstrap and the AMM workflows.

use std::path::PathBuf;

use objsync_core::{ObjectId, PackageBuilder, ResourceKind};
use objsync_storage::{ArtifactRecord, ArtifactSet};

use crate::error::{ProvisionError, ReconcileError};
use crate::provision::PackageProvisioner;
use crate::reconciler::{Outcome, Provisioned, Reconciler};

/// Where a package comes from.
#[derive(Debug, Clone)]
pub struct PackageRequest<'a> {
    pub label: &'a str,
    pub path: PathBuf,
    /// Explicit on-chain package id; must exist.
    pub override_id: Option<&'a str>,
    /// Ignore any cached record and publish again.
    pub re_publish: bool,
    pub with_unpublished_dependencies: bool,
    /// `(role, type suffix)` pairs of objects created at publish time.
    pub tracked: Vec<(&'static str, String)>,
}

/// Fails when an explicit package id is combined with a republish.
pub fn check_override_conflict(
    label: &str,
    override_id: Option<&str>,
    re_publish: bool,
) -> Result<(), ReconcileError> {
    if override_id.is_some() && re_publish {
        return Err(ReconcileError::new(
            ResourceKind::Package,
            label,
            ProvisionError::conflict(format!(
                "an explicit {label} package id cannot be combined with --re-publish"
            )),
        ));
    }
    Ok(())
}

/// Resolves a package: explicit id, then a cached record that still
/// exists, then a fresh publish.
pub async fn ensure_package(
    reconciler: &Reconciler,
    builder: &dyn PackageBuilder,
    artifacts: &ArtifactSet,
    request: PackageRequest<'_>,
) -> Result<Provisioned, ReconcileError> {
    check_override_conflict(request.label, request.override_id, request.re_publish)?;
    let fail = |err: ProvisionError| ReconcileError::new(ResourceKind::Package, request.label, err);

    let cached = artifacts.get(ResourceKind::Package, request.label);

    if let Some(raw) = request.override_id {
        let package_id = ObjectId::parse(raw.trim()).map_err(|e| fail(e.into()))?;
        let package = reconciler
            .ledger()
            .get_object(package_id)
            .await
            .map_err(|_| fail(ProvisionError::not_found("package", package_id)))?;
        if !package.is_package {
            return Err(fail(ProvisionError::validation(format!(
                "{package_id} is not a package"
            ))));
        }

        if let Some(record) = cached.filter(|record| record.object_id == package_id) {
            return Ok(Provisioned {
                record: record.clone(),
                outcome: Outcome::Reused,
                attempts: 0,
            });
        }

        tracing::info!(label = %request.label, %package_id, "using explicit package id");
        let record = ArtifactRecord::new(
            reconciler.network(),
            ResourceKind::Package,
            request.label,
            package_id,
        )
        .with_object_type("package");
        reconciler.persist(record.clone()).await.map_err(fail)?;
        return Ok(Provisioned {
            record,
            outcome: Outcome::Reused,
            attempts: 0,
        });
    }

    let mut provisioner = PackageProvisioner::new(request.label, request.path, builder)
        .with_unpublished_dependencies(request.with_unpublished_dependencies);
    for (role, suffix) in request.tracked {
        provisioner = provisioner.track(role, suffix);
    }

    let existing = if request.re_publish { None } else { cached };
    reconciler.ensure(&provisioner, existing).await
}

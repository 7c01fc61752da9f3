use std::path::PathBuf;

use async_trait::async_trait;
use objsync_core::{PackageBuilder, PublishPlan, ResourceDescriptor, ResourceKind};
use objsync_storage::ArtifactRecord;

use super::{attrs, roles};
use crate::error::{ProvisionError, ProvisionResult};
use crate::reconciler::{Creation, Provisioner, Reconciler};
use crate::wait::wait_for_package;

const UPGRADE_CAP_SUFFIX: &str = "::package::UpgradeCap";

/// Compiles and publishes a Move package, then waits until the package can
/// be read back.
pub struct PackageProvisioner<'a> {
    descriptor: ResourceDescriptor,
    path: PathBuf,
    builder: &'a dyn PackageBuilder,
    with_unpublished_dependencies: bool,
    tracked: Vec<(String, String)>,
}

impl<'a> PackageProvisioner<'a> {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, builder: &'a dyn PackageBuilder) -> Self {
        Self {
            descriptor: ResourceDescriptor::package(label),
            path: path.into(),
            builder,
            with_unpublished_dependencies: false,
            tracked: Vec::new(),
        }
    }

    pub fn with_unpublished_dependencies(mut self, enabled: bool) -> Self {
        self.with_unpublished_dependencies = enabled;
        self
    }

    /// Records the first created object whose type ends with `type_suffix`
    /// under `role`.
    pub fn track(mut self, role: impl Into<String>, type_suffix: impl Into<String>) -> Self {
        self.tracked.push((role.into(), type_suffix.into()));
        self
    }
}

#[async_trait]
impl Provisioner for PackageProvisioner<'_> {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    async fn create(&self, reconciler: &Reconciler) -> ProvisionResult<Creation> {
        if reconciler.mode().is_dry_run() {
            return Err(ProvisionError::validation(format!(
                "package {} would have to be published, which a dry run cannot do",
                self.descriptor.label()
            )));
        }

        let compiled = self
            .builder
            .build(&self.path, self.with_unpublished_dependencies)
            .await?;
        tracing::info!(
            label = %self.descriptor.label(),
            path = %self.path.display(),
            modules = compiled.modules.len(),
            "publishing package"
        );

        let plan = PublishPlan::new(self.descriptor.label(), compiled.modules, compiled.dependencies);
        let submitted = reconciler.executor().publish_with_funding_retry(&plan).await?;
        let effects = submitted.effects;

        let package_id = effects
            .published_package
            .ok_or_else(|| ProvisionError::missing_created("package", effects.digest.clone()))?;

        wait_for_package(reconciler.ledger().as_ref(), package_id, reconciler.wait_policy()).await?;

        let mut record = ArtifactRecord::new(
            reconciler.network(),
            ResourceKind::Package,
            self.descriptor.label(),
            package_id,
        )
        .with_object_type("package")
        .with_digest(effects.digest.clone())
        .with_attribute(attrs::SOURCE_PATH, self.path.display().to_string())
        .with_optional_auxiliary_id(roles::UPGRADE_CAP, effects.first_created_id(UPGRADE_CAP_SUFFIX));

        for (role, suffix) in &self.tracked {
            record = record.with_optional_auxiliary_id(role.clone(), effects.first_created_id(suffix));
        }

        Ok(Creation {
            record,
            attempts: submitted.attempts,
        })
    }
}

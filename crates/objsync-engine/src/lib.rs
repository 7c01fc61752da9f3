//! # objsync-engine
//!
//! Resolve-or-create reconciliation of on-chain resources.
//!
//! The pieces, leaves first:
//! - [`retry`]: bounded retry driven by an error classifier
//! - [`executor`]: funds the signer and resubmits after contention
//! - [`wait`]: polls until a published package is observable
//! - [`authorization`]: explicit, owned or claimed capabilities
//! - [`reconciler`]: revalidates cached artifacts and recreates stale ones
//! - [`provision`]: per-kind creation plans
//! - [`bootstrap`] and [`amm`]: the workflows the CLI exposes
//!
//! Every workflow processes resources sequentially; there is never more
//! than one mutating submission in flight per run.

pub mod amm;
pub mod authorization;
pub mod bootstrap;
pub mod error;
pub mod executor;
pub mod packages;
pub mod provision;
pub mod reconciler;
pub mod retry;
pub mod wait;

#[cfg(test)]
pub mod testing;

pub use authorization::{
    CapabilityRequest, CapabilityResolver, CapabilitySource, CapabilitySpec, ResolvedCapability,
    check_capability_conflict,
};
pub use error::{ProvisionError, ProvisionResult, ReconcileError, Stage};
pub use executor::{FundingExecutor, Submitted};
pub use reconciler::{Creation, Outcome, Provisioned, Provisioner, Reconciler};
pub use retry::{Exhausted, Retried, RetryPolicy, retry_with};
pub use wait::{WaitPolicy, wait_for_package};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::amm::{AmmSettings, FeedSelector};
    pub use crate::bootstrap::{MockSetupOptions, MockSetupReport, MockSetupSettings};
    pub use crate::{
        FundingExecutor, Outcome, ProvisionError, ReconcileError, Reconciler, RetryPolicy,
        WaitPolicy,
    };
}

//! Availability polling for freshly published packages.

use std::time::Duration;

use objsync_core::{DiscoveredResource, LedgerClient, ObjectId};
use tokio::time::Instant;

use crate::error::{ProvisionError, ProvisionResult};

/// Poll cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            interval: Duration::from_millis(250),
        }
    }
}

/// Polls until `id` reads back as a package.
///
/// Read errors count as "not yet"; only the deadline ends the wait.
pub async fn wait_for_package(
    ledger: &dyn LedgerClient,
    id: ObjectId,
    policy: WaitPolicy,
) -> ProvisionResult<DiscoveredResource> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut polls = 0u32;

    loop {
        polls += 1;
        match ledger.get_object(id).await {
            Ok(resource) if resource.is_package => {
                tracing::debug!(package_id = %id, polls, "package available");
                return Ok(resource);
            }
            Ok(_) => tracing::debug!(package_id = %id, polls, "object is not a package yet"),
            Err(err) => tracing::debug!(package_id = %id, polls, error = %err, "package not visible yet"),
        }

        if Instant::now() + policy.interval > deadline {
            return Err(ProvisionError::Timeout {
                object_id: id.to_string(),
                waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

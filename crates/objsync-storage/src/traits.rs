//! The artifact cache contract.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{ArtifactPatch, ArtifactSet};

/// Persistent mapping from `(network, kind, label)` to recorded identifiers.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes are always
/// merges: records absent from a patch are left untouched.
///
/// # Example
///
/// ```ignore
/// use objsync_core::ResourceKind;
/// use objsync_storage::{ArtifactStore, StorageError};
///
/// async fn feed_id(store: &dyn ArtifactStore) -> Result<Option<String>, StorageError> {
///     let set = store.read("localnet").await?;
///     Ok(set
///         .get(ResourceKind::PriceFeed, "MOCK_SUI_FEED")
///         .map(|record| record.object_id.to_string()))
/// }
/// ```
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Reads every record of `network`. A network with no records yields an
    /// empty set, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues or corrupt data.
    async fn read(&self, network: &str) -> Result<ArtifactSet, StorageError>;

    /// Merges `patch` into the stored set and returns the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` when a record fails validation;
    /// nothing is written in that case.
    async fn write(&self, network: &str, patch: ArtifactPatch) -> Result<ArtifactSet, StorageError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

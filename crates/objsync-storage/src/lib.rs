//! # objsync-storage
//!
//! Artifact cache abstraction for objsync.
//!
//! The cache remembers which ledger objects were created for each
//! `(network, kind, label)` so later runs can revalidate and reuse them
//! instead of provisioning again. This crate only defines the contract;
//! backends live in `objsync-db-memory` and `objsync-db-json`.
//!
//! Records are merged, never blindly overwritten: see
//! [`ArtifactRecord::merge`].

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::ArtifactStore;
pub use types::{ArtifactKey, ArtifactPatch, ArtifactRecord, ArtifactSet};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable artifact store.
pub type DynArtifactStore = std::sync::Arc<dyn ArtifactStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ArtifactKey, ArtifactPatch, ArtifactRecord, ArtifactSet, ArtifactStore, DynArtifactStore,
        StorageError, StorageResult,
    };
}

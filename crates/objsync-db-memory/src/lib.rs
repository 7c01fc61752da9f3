//! In-memory artifact cache backend for objsync.
//!
//! This crate provides an implementation of the `ArtifactStore` trait from
//! `objsync-storage` backed by a papaya lock-free HashMap. Nothing is
//! persisted; it is used by tests and by embedders that keep state
//! elsewhere.
//!
//! # Example
//!
//! ```ignore
//! use objsync_db_memory::InMemoryArtifactStore;
//! use objsync_storage::{ArtifactPatch, ArtifactStore};
//!
//! let store = InMemoryArtifactStore::new();
//! store.write("localnet", ArtifactPatch::single(record)).await?;
//! let set = store.read("localnet").await?;
//! ```

pub mod store;

pub use objsync_storage::{ArtifactStore, StorageError};
pub use store::InMemoryArtifactStore;

/// Creates a new shareable in-memory store.
pub fn create_artifact_store() -> objsync_storage::DynArtifactStore {
    std::sync::Arc::new(InMemoryArtifactStore::new())
}

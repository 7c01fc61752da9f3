//! JSON file artifact cache backend for objsync.
//!
//! Each network is stored in its own file, `<dir>/artifacts.<network>.json`,
//! so that localnet churn never rewrites testnet records.

mod store;

pub use objsync_storage::{ArtifactStore, StorageError};
pub use store::JsonFileArtifactStore;

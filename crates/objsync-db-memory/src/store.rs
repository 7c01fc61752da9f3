use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use objsync_storage::{ArtifactPatch, ArtifactSet, ArtifactStore, StorageError};
use papaya::HashMap as PapayaHashMap;
use tokio::sync::Mutex;

/// In-memory artifact store.
///
/// Reads are lock-free. Writes are serialized so that concurrent merges of
/// the same network never lose records.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    networks: PapayaHashMap<String, ArtifactSet>,
    write_lock: Mutex<()>,
    writes: AtomicU64,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `set`.
    pub fn with_set(set: ArtifactSet) -> Self {
        let store = Self::new();
        store.networks.pin().insert(set.network.clone(), set);
        store
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn snapshot(&self, network: &str) -> ArtifactSet {
        self.networks
            .pin()
            .get(network)
            .cloned()
            .unwrap_or_else(|| ArtifactSet::empty(network))
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn read(&self, network: &str) -> Result<ArtifactSet, StorageError> {
        Ok(self.snapshot(network))
    }

    async fn write(&self, network: &str, patch: ArtifactPatch) -> Result<ArtifactSet, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut set = self.snapshot(network);
        set.apply(patch)?;
        self.networks.pin().insert(network.to_string(), set.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(network, records = set.len(), "artifact set updated in memory");
        Ok(set)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

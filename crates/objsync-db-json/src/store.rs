use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use objsync_storage::{ArtifactPatch, ArtifactSet, ArtifactStore, StorageError};
use tokio::fs;
use tokio::sync::Mutex;

/// Artifact store persisted as pretty-printed JSON files.
///
/// Writes go through a temporary file and a rename so that an interrupted
/// run leaves either the old or the new file, never a truncated one.
#[derive(Debug)]
pub struct JsonFileArtifactStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the records of `network`.
    pub fn path_for(&self, network: &str) -> PathBuf {
        self.dir.join(format!("artifacts.{network}.json"))
    }

    async fn load(&self, network: &str) -> Result<ArtifactSet, StorageError> {
        let path = self.path_for(network);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ArtifactSet::empty(network)),
            Err(e) => return Err(StorageError::io(path.display().to_string(), e.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(ArtifactSet::empty(network));
        }

        let set: ArtifactSet = serde_json::from_str(&content).map_err(|e| {
            StorageError::serialization(format!("{}: {e}", path.display()))
        })?;

        if set.network != network {
            return Err(StorageError::invalid_record(
                path.display().to_string(),
                format!("file holds network {} instead of {network}", set.network),
            ));
        }
        Ok(set)
    }

    async fn persist(&self, set: &ArtifactSet) -> Result<(), StorageError> {
        let path = self.path_for(&set.network);
        let tmp = self.dir.join(format!(".artifacts.{}.json.tmp", set.network));
        let io_err = |p: &Path, e: std::io::Error| StorageError::io(p.display().to_string(), e.to_string());

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err(&self.dir, e))?;

        let mut content = serde_json::to_string_pretty(set)?;
        content.push('\n');

        fs::write(&tmp, content).await.map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for JsonFileArtifactStore {
    async fn read(&self, network: &str) -> Result<ArtifactSet, StorageError> {
        self.load(network).await
    }

    async fn write(&self, network: &str, patch: ArtifactPatch) -> Result<ArtifactSet, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut set = self.load(network).await?;
        set.apply(patch)?;
        self.persist(&set).await?;

        tracing::debug!(
            network,
            path = %self.path_for(network).display(),
            records = set.len(),
            "artifact file written"
        );
        Ok(set)
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}

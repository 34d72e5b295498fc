//! Local filesystem snapshot store.
//!
//! Keeps the snapshot as a single JSON document. Writes go to a temporary
//! file that is renamed over the previous snapshot, so readers never observe
//! a partially written file.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── signs.json            # {updated_at, count, signs}
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SignRecord;
use crate::storage::{LoadSummary, SnapshotData, SnapshotStore};

const SNAPSHOT_KEY: &str = "signs.json";

/// JSON file snapshot backend.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root_dir: PathBuf,
}

impl JsonStore {
    /// Create a new JsonStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read the full snapshot document including its header.
    pub async fn load_snapshot(&self) -> Result<Option<SnapshotData>> {
        self.read_json(SNAPSHOT_KEY).await
    }
}

#[async_trait(?Send)]
impl SnapshotStore for JsonStore {
    async fn replace_all(&mut self, signs: &[SignRecord]) -> Result<LoadSummary> {
        let data = SnapshotData::new(signs.to_vec());
        self.write_json(SNAPSHOT_KEY, &data)
            .await
            .map_err(|e| AppError::load(format!("writing {}: {}", self.location(), e)))?;

        log::info!("Wrote {} signs to {}", data.count, self.location());
        Ok(LoadSummary {
            count: data.count,
            location: self.location(),
            timestamp: data.updated_at,
        })
    }

    async fn load_current(&self) -> Result<Vec<SignRecord>> {
        match self.load_snapshot().await? {
            Some(data) => Ok(data.signs),
            None => {
                log::warn!("No {} found", SNAPSHOT_KEY);
                Ok(Vec::new())
            }
        }
    }

    fn location(&self) -> String {
        self.path(SNAPSHOT_KEY).display().to_string()
    }
}

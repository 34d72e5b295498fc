//! Storage abstractions for the sign snapshot.
//!
//! A snapshot is always replaced as a whole. Backends guarantee that a reader
//! sees either the previous snapshot or the new one, never an empty or
//! partially written collection.
//!
//! ## Backends
//!
//! ```text
//! sqlite:  {database}              # table `signs`, uuid primary key
//! json:    {snapshot_dir}/
//!          └── signs.json          # {updated_at, count, signs}
//! ```

pub mod local;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{SignRecord, StorageBackend, StorageConfig};

// Re-export for convenience
pub use local::JsonStore;
pub use sqlite::SqliteStore;

/// Outcome of a snapshot replacement.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    /// Number of signs in the new snapshot
    pub count: usize,
    /// Where the snapshot was written
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

/// On-disk layout of `signs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    pub count: usize,
    pub signs: Vec<SignRecord>,
}

impl SnapshotData {
    pub fn new(signs: Vec<SignRecord>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: signs.len(),
            signs,
        }
    }
}

/// Trait for snapshot storage backends.
///
/// Futures are not `Send`: a SQLite connection is not `Sync`, and the
/// pipeline drives the store from a single task.
#[async_trait(?Send)]
pub trait SnapshotStore {
    /// Atomically replace every stored sign with `signs`.
    ///
    /// On failure the previous snapshot must remain intact.
    async fn replace_all(&mut self, signs: &[SignRecord]) -> Result<LoadSummary>;

    /// Load the current snapshot. Empty when nothing has been stored yet.
    async fn load_current(&self) -> Result<Vec<SignRecord>>;

    /// Human-readable location used in log lines.
    fn location(&self) -> String;
}

/// Open the configured backend.
///
/// The returned handle is owned by a single run and released when dropped.
pub fn open(config: &StorageConfig) -> Result<Box<dyn SnapshotStore>> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Box::new(SqliteStore::open(&config.database)?)),
        StorageBackend::Json => Ok(Box::new(JsonStore::new(&config.snapshot_dir))),
    }
}

//! SQLite snapshot store.
//!
//! One `signs` table keyed by uuid. A replacement deletes every row and
//! inserts the new snapshot inside a single transaction; any failure rolls
//! back to the previous rows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use crate::error::{AppError, Result};
use crate::models::{DisplayType, MergeDirection, SignIdentity, SignRecord};
use crate::storage::{LoadSummary, SnapshotStore};

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS signs (
            uuid TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL,
            road TEXT,
            carriageway TEXT,
            lane INTEGER,
            km REAL,
            speed_limit INTEGER,
            is_flashing INTEGER,
            has_red_ring INTEGER,
            arrow_direction TEXT CHECK(arrow_direction IN ('LEFT','RIGHT'))
        );
        ",
    )?;

    Ok(())
}

/// SQLite snapshot backend.
///
/// Owns its connection; open one per run and drop it when the run ends.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| AppError::load(format!("open sqlite db {}: {}", path.display(), e)))?;
        migrate(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    fn replace_rows(&mut self, signs: &[SignRecord]) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM signs", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO signs (uuid, type, road, carriageway, lane, km, speed_limit, is_flashing, has_red_ring, arrow_direction)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for sign in signs {
                insert.execute(params![
                    sign.uuid.as_str(),
                    sign.display_type.as_str(),
                    sign.road,
                    sign.carriageway,
                    sign.lane,
                    sign.km,
                    sign.speed_limit,
                    sign.is_flashing,
                    sign.has_red_ring,
                    sign.arrow_direction.map(|d| d.as_str()),
                ])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn read_rows(&self) -> Result<Vec<SignRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, type, road, carriageway, lane, km, speed_limit, is_flashing, has_red_ring, arrow_direction
             FROM signs ORDER BY uuid",
        )?;
        let rows = stmt.query_map([], RawRow::from_row)?;

        let mut signs = Vec::new();
        for row in rows {
            signs.push(row?.into_record()?);
        }
        Ok(signs)
    }
}

/// Row as stored, before enum columns are decoded.
struct RawRow {
    uuid: String,
    display_type: String,
    road: Option<String>,
    carriageway: Option<String>,
    lane: Option<i32>,
    km: Option<f64>,
    speed_limit: Option<u32>,
    is_flashing: Option<bool>,
    has_red_ring: Option<bool>,
    arrow_direction: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get(0)?,
            display_type: row.get(1)?,
            road: row.get(2)?,
            carriageway: row.get(3)?,
            lane: row.get(4)?,
            km: row.get(5)?,
            speed_limit: row.get(6)?,
            is_flashing: row.get(7)?,
            has_red_ring: row.get(8)?,
            arrow_direction: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<SignRecord> {
        Ok(SignRecord {
            uuid: SignIdentity::new(self.uuid),
            display_type: self.display_type.parse::<DisplayType>()?,
            road: self.road,
            carriageway: self.carriageway,
            lane: self.lane,
            km: self.km,
            speed_limit: self.speed_limit,
            is_flashing: self.is_flashing,
            has_red_ring: self.has_red_ring,
            arrow_direction: self
                .arrow_direction
                .as_deref()
                .map(str::parse::<MergeDirection>)
                .transpose()?,
        })
    }
}

#[async_trait(?Send)]
impl SnapshotStore for SqliteStore {
    async fn replace_all(&mut self, signs: &[SignRecord]) -> Result<LoadSummary> {
        let removed = self.replace_rows(signs).map_err(|e| {
            AppError::load(format!("replacing snapshot in {}: {}", self.location(), e))
        })?;

        log::info!(
            "Replaced {} signs with {} in {}",
            removed,
            signs.len(),
            self.location()
        );
        Ok(LoadSummary {
            count: signs.len(),
            location: self.location(),
            timestamp: Utc::now(),
        })
    }

    async fn load_current(&self) -> Result<Vec<SignRecord>> {
        self.read_rows()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn speed_sign(id: &str, limit: u32) -> SignRecord {
        let mut record = SignRecord::new(id.into());
        record.display_type = DisplayType::SpeedLimit;
        record.road = Some("A1".into());
        record.carriageway = Some("main".into());
        record.lane = Some(2);
        record.km = Some(10.5);
        record.speed_limit = Some(limit);
        record.has_red_ring = Some(false);
        record.is_flashing = Some(true);
        record
    }

    fn arrow_sign(id: &str) -> SignRecord {
        let mut record = SignRecord::new(id.into());
        record.display_type = DisplayType::LaneClosedAhead;
        record.arrow_direction = Some(MergeDirection::Left);
        record.is_flashing = Some(false);
        record
    }

    #[tokio::test]
    async fn test_replace_and_load() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteStore::open(&tmp.path().join("signs.db")).unwrap();

        let signs = vec![speed_sign("a", 100), arrow_sign("b"), SignRecord::new("c".into())];
        let summary = store.replace_all(&signs).await.unwrap();
        assert_eq!(summary.count, 3);

        assert_eq!(store.load_current().await.unwrap(), signs);
    }

    #[tokio::test]
    async fn test_replace_drops_previous_rows() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteStore::open(&tmp.path().join("signs.db")).unwrap();

        store
            .replace_all(&[speed_sign("a", 100), speed_sign("b", 80)])
            .await
            .unwrap();
        store.replace_all(&[arrow_sign("c")]).await.unwrap();

        assert_eq!(store.load_current().await.unwrap(), vec![arrow_sign("c")]);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteStore::open(&tmp.path().join("signs.db")).unwrap();
        let previous = vec![speed_sign("a", 100), arrow_sign("b")];
        store.replace_all(&previous).await.unwrap();

        // Duplicate uuid violates the primary key halfway through the insert
        let broken = vec![speed_sign("x", 50), speed_sign("y", 60), speed_sign("x", 70)];
        let result = store.replace_all(&broken).await;
        assert!(matches!(result, Err(AppError::Load(_))));

        assert_eq!(store.load_current().await.unwrap(), previous);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/signs.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.replace_all(&[speed_sign("a", 90)]).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_current().await.unwrap(), vec![speed_sign("a", 90)]);
    }
}

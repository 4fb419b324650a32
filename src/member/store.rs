//! SQLite persistence for member records
//!
//! Records are stored whole as JSON. `save` is a full-record upsert, so the
//! last writer wins.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use super::MemberRecord;
use crate::error::{OnboardError, Result};

pub struct MemberStore {
    db: Connection,
}

impl MemberStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)?;
        db.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self::init(db)?;
        info!(path = %path.display(), "Member store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                discord_id TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );",
        )?;

        Ok(Self { db })
    }

    /// Insert a new record. Fails if the id or Discord id is taken.
    pub fn insert(&self, record: &MemberRecord) -> Result<()> {
        let data = serde_json::to_string(record)?;
        self.db
            .execute(
                "INSERT INTO members (id, discord_id, data, updated_at)
                 VALUES (?1, ?2, ?3, strftime('%s', 'now'))",
                params![record.id.to_string(), record.discord_id, data],
            )
            .map_err(|e| taken(e, &record.discord_id))?;

        debug!(id = %record.id, "Inserted member");
        Ok(())
    }

    /// Persist the whole record, creating it if needed.
    pub fn save(&self, record: &MemberRecord) -> Result<()> {
        let data = serde_json::to_string(record)?;
        self.db
            .execute(
                "INSERT INTO members (id, discord_id, data, updated_at)
                 VALUES (?1, ?2, ?3, strftime('%s', 'now'))
                 ON CONFLICT(id) DO UPDATE SET
                    discord_id = ?2, data = ?3, updated_at = strftime('%s', 'now')",
                params![record.id.to_string(), record.discord_id, data],
            )
            .map_err(|e| taken(e, &record.discord_id))?;

        debug!(id = %record.id, bytes = data.len(), "Saved member");
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<MemberRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT data FROM members WHERE id = ?1")?;
        let data: Option<String> = stmt
            .query_row([id.to_string()], |row| row.get(0))
            .optional()?;

        data.map(|data| decode(&data)).transpose()
    }

    pub fn get_by_discord_id(&self, discord_id: &str) -> Result<Option<MemberRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT data FROM members WHERE discord_id = ?1")?;
        let data: Option<String> = stmt
            .query_row([discord_id], |row| row.get(0))
            .optional()?;

        data.map(|data| decode(&data)).transpose()
    }

    /// Every member in the order they were first stored.
    pub fn list(&self) -> Result<Vec<MemberRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT data FROM members ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let members = rows
            .map(|data| decode(&data?))
            .collect::<Result<Vec<_>>>()?;
        Ok(members)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Unique violations mean another member already holds the Discord id.
fn taken(err: rusqlite::Error, discord_id: &str) -> OnboardError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            OnboardError::Conflict(format!(
                "member with discord id {} already exists",
                discord_id
            ))
        }
        other => other.into(),
    }
}

fn decode(data: &str) -> Result<MemberRecord> {
    serde_json::from_str(data)
        .map_err(|e| OnboardError::Database(format!("corrupt member record: {}", e)))
}

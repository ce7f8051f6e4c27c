//! SQLite-backed snapshot layer for the auction ledger.
//!
//! One key-value table holds a JSON document per named record. Each mutation
//! batch is written in a single transaction so a collection set is never
//! half-visible on disk.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::warn;

// Named records
pub const REC_TOURNAMENTS: &str = "tournaments";
pub const REC_TEAMS: &str = "teams";
pub const REC_CATEGORIES: &str = "categories";
pub const REC_PLAYERS: &str = "players";
pub const REC_BIDS: &str = "bids";
pub const REC_NEXT_ID: &str = "next_id";

// Persisted configuration strings
pub const REC_SYNC_ENDPOINT: &str = "sync_endpoint";
pub const REC_SHEET_URL: &str = "sheet_url";

/// Durable key-value store for the ledger's named records.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening snapshot db at {}", path))?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Ephemeral store for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Read one raw record, None when the key was never written
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM snapshots WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Read a JSON record, falling back to the default when the key is absent.
    /// An unreadable record is discarded with a warning rather than aborting
    /// startup.
    pub fn load_record<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.load(key)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("[STORE] Discarding unreadable snapshot record '{}': {}", key, e);
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    /// Write a single record
    pub fn save(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Write a batch of records in one transaction
    pub fn save_batch(&self, entries: &[(&str, String)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let now = chrono::Utc::now().timestamp();
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

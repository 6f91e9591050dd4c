//! Device-local metadata repository
//!
//! Key/value state that belongs to this installation only: the device id
//! stamped on outgoing snapshots and the outcome of the last sync cycle.

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

const DEVICE_ID_KEY: &str = "device_id";
const LAST_SYNC_AT_KEY: &str = "last_sync_at";
const LAST_SYNC_STATUS_KEY: &str = "last_sync_status";

/// Outcome of the most recent sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSync {
    /// When the cycle finished (Unix ms)
    pub at: Option<i64>,
    /// `succeeded` or `failed: <reason>`
    pub status: Option<String>,
}

/// Trait for local metadata operations
pub trait MetaRepository {
    /// Device id for this installation; read-only
    fn device_id(&self) -> Result<String>;

    /// Generate the device id unless one is already stored
    fn ensure_device_id(&self) -> Result<String>;

    /// Load the last sync outcome
    fn last_sync(&self) -> Result<LastSync>;

    /// Persist a sync outcome
    fn record_sync(&self, at: i64, status: &str) -> Result<()>;
}

/// `SQLite` implementation of `MetaRepository`
pub struct SqliteMetaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteMetaRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_meta WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_meta (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl MetaRepository for SqliteMetaRepository<'_> {
    fn device_id(&self) -> Result<String> {
        self.get(DEVICE_ID_KEY)?
            .ok_or_else(|| Error::NotFound(DEVICE_ID_KEY.to_string()))
    }

    fn ensure_device_id(&self) -> Result<String> {
        if let Some(id) = self.get(DEVICE_ID_KEY)? {
            return Ok(id);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.set(DEVICE_ID_KEY, &id)?;
        tracing::info!("Generated device id {id}");
        Ok(id)
    }

    fn last_sync(&self) -> Result<LastSync> {
        Ok(LastSync {
            at: self
                .get(LAST_SYNC_AT_KEY)?
                .and_then(|value| value.parse().ok()),
            status: self.get(LAST_SYNC_STATUS_KEY)?,
        })
    }

    fn record_sync(&self, at: i64, status: &str) -> Result<()> {
        self.set(LAST_SYNC_AT_KEY, &at.to_string())?;
        self.set(LAST_SYNC_STATUS_KEY, status)
    }
}

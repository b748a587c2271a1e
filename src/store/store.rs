//! State Store Module
//!
//! SQLite-backed key-value engine with JSON values, TTL expiration and
//! per-entry metadata.
//!
//! ## Schema
//! ```sql
//! CREATE TABLE state (
//!     key TEXT PRIMARY KEY,
//!     value TEXT NOT NULL,        -- compact JSON encoding
//!     type TEXT NOT NULL,         -- null | array | object | string | number | boolean
//!     agent TEXT NOT NULL,        -- last writer
//!     created_at INTEGER NOT NULL,
//!     updated_at INTEGER NOT NULL,
//!     accessed_at INTEGER NOT NULL,
//!     expires_at INTEGER          -- Unix ms, NULL = no expiry
//! ) WITHOUT ROWID;
//! ```
//!
//! The database runs in WAL mode so readers never wait on a writer, and every
//! connection carries a busy timeout so a contended write fails with
//! [`StateError::Busy`] instead of hanging.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, StateError};
use crate::store::entry::{current_timestamp_ms, expiry_from_ttl};
use crate::store::{
    EntryMeta, ListedEntry, SetOutcome, StoredValue, ValueType, DEFAULT_AGENT, MAX_VALUE_BYTES,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS state (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        type TEXT NOT NULL,
        agent TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        accessed_at INTEGER NOT NULL,
        expires_at INTEGER
    ) WITHOUT ROWID
    "#,
    "CREATE INDEX IF NOT EXISTS idx_state_updated ON state(updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_state_agent ON state(agent)",
    "CREATE INDEX IF NOT EXISTS idx_state_expires ON state(expires_at)",
];

// created_at is only written on first insert; the conflict branch leaves it alone
const UPSERT: &str = r#"
    INSERT INTO state (key, value, type, agent, created_at, updated_at, accessed_at, expires_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        type = excluded.type,
        agent = excluded.agent,
        updated_at = excluded.updated_at,
        accessed_at = excluded.accessed_at,
        expires_at = excluded.expires_at
"#;

// == State Store ==
/// Durable key-value store shared by every process that opens the same file.
///
/// Holds no entry cache; each call goes to the database, so writes from other
/// processes are visible as soon as they commit.
#[derive(Debug, Clone)]
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    // == Constructors ==
    /// Opens (creating if needed) the database described by `config`.
    ///
    /// Creates the parent directory and applies the schema. Safe to run from
    /// several processes at once: every statement is idempotent and waits on
    /// the busy timeout if another process is mid-migration.
    pub async fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL under WAL survives a process crash; power loss can drop the last commits
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout())
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        info!("State store opened at {}", config.db_path.display());
        Ok(store)
    }

    /// Opens a private in-memory store. Nothing is persisted.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single connection that never recycles; each new connection would
        // see a different empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    // == Set ==
    /// Stores a JSON value under `key`, replacing any existing entry.
    ///
    /// # Arguments
    /// * `key` - Non-empty key
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in milliseconds (`0` means no expiry)
    /// * `agent` - Writer label, `"unknown"` when blank
    pub async fn set(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<u64>,
        agent: &str,
    ) -> Result<SetOutcome> {
        validate_key(key)?;

        let serialized = serde_json::to_string(value).map_err(|_| StateError::NotSerializable)?;
        let size = serialized.len();
        if size > MAX_VALUE_BYTES {
            return Err(StateError::ValueTooLarge {
                size,
                limit: MAX_VALUE_BYTES,
            });
        }

        let now = current_timestamp_ms();
        let expires_at = expiry_from_ttl(now, ttl);
        let value_type = ValueType::of(value);

        sqlx::query(UPSERT)
            .bind(key)
            .bind(&serialized)
            .bind(value_type.as_str())
            .bind(normalize_agent(agent))
            .bind(now)
            .bind(now)
            .bind(now)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        debug!(key, size, %value_type, "Stored entry");

        Ok(SetOutcome {
            key: key.to_string(),
            size,
            ttl: ttl.filter(|ms| *ms > 0),
        })
    }

    /// Serializes any value and stores it.
    ///
    /// Values serde_json refuses to encode (such as maps with non-string
    /// keys) are rejected with [`StateError::NotSerializable`] and nothing is
    /// written.
    pub async fn set_serializable<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
        agent: &str,
    ) -> Result<SetOutcome> {
        let value = serde_json::to_value(value).map_err(|_| StateError::NotSerializable)?;
        self.set(key, &value, ttl, agent).await
    }

    // == Get ==
    /// Retrieves a live value and touches its `accessed_at`.
    ///
    /// Returns `None` for missing or expired keys.
    pub async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        validate_key(key)?;
        let now = current_timestamp_ms();

        let row = sqlx::query(
            "SELECT value, type FROM state \
             WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(key, "Lookup miss");
            return Ok(None);
        };

        let raw: String = row.try_get("value")?;
        let value_type = decode_type(&row)?;
        let value = serde_json::from_str(&raw)
            .map_err(|e| StateError::Corrupt(format!("value of '{}': {}", key, e)))?;

        sqlx::query("UPDATE state SET accessed_at = ? WHERE key = ?")
            .bind(now)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(Some(StoredValue { value, value_type }))
    }

    // == Meta ==
    /// Returns the metadata of an entry without loading or touching it.
    ///
    /// Rows that have expired but were not purged yet are still reported;
    /// their `expires_at` shows it.
    pub async fn meta(&self, key: &str) -> Result<Option<EntryMeta>> {
        validate_key(key)?;

        let row = sqlx::query(
            "SELECT key, type, agent, created_at, updated_at, accessed_at, expires_at \
             FROM state WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<EntryMeta> {
            Ok(EntryMeta {
                key: row.try_get("key")?,
                value_type: decode_type(&row)?,
                agent: row.try_get("agent")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
                accessed_at: row.try_get("accessed_at")?,
                expires_at: row.try_get("expires_at")?,
            })
        })
        .transpose()
    }

    // == List ==
    /// Lists live entries, most recently written first. Values are not loaded.
    pub async fn list(&self) -> Result<Vec<ListedEntry>> {
        let rows = sqlx::query(
            "SELECT key, type, agent, updated_at, expires_at FROM state \
             WHERE expires_at IS NULL OR expires_at > ? \
             ORDER BY updated_at DESC, key ASC",
        )
        .bind(current_timestamp_ms())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ListedEntry> {
                Ok(ListedEntry {
                    key: row.try_get("key")?,
                    value_type: decode_type(row)?,
                    agent: row.try_get("agent")?,
                    updated_at: row.try_get("updated_at")?,
                    expires_at: row.try_get("expires_at")?,
                })
            })
            .collect()
    }

    // == Delete ==
    /// Removes an entry. Returns whether a row was actually removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let result = sqlx::query("DELETE FROM state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(key, deleted, "Delete");
        Ok(deleted)
    }

    // == Clear ==
    /// Removes every row, expired ones included, and returns how many went.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM state").execute(&self.pool).await?;
        let cleared = result.rows_affected();
        info!("State store cleared ({} entries removed)", cleared);
        Ok(cleared)
    }

    // == Purge Expired ==
    /// Physically removes expired rows.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM state WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(current_timestamp_ms())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    // == Count ==
    /// Number of rows physically present, expired ones included.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM state")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Closes the pool, waiting for in-flight statements and checkpointing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StateError::Validation("key is required".to_string()));
    }
    Ok(())
}

fn normalize_agent(agent: &str) -> &str {
    let agent = agent.trim();
    if agent.is_empty() {
        DEFAULT_AGENT
    } else {
        agent
    }
}

fn decode_type(row: &SqliteRow) -> Result<ValueType> {
    let tag: String = row.try_get("type")?;
    tag.parse().map_err(StateError::Corrupt)
}

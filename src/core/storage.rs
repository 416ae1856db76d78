//! # Key-Value Storage
//!
//! The persistence primitive every feature sits on: a string key-value store
//! with `get`, `set` and `remove`. No transactional guarantees.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: JSON helpers for structured values
//! - 1.0.0: SQLite and in-memory stores

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read a JSON value stored under `key`
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt JSON stored under '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and store it under `key`
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

/// SQLite-backed store, one row per key
#[derive(Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `:memory:` works too.
    pub fn open(path: &str) -> Result<Self> {
        let connection =
            sqlite::open(path).with_context(|| format!("Failed to open database at {path}"))?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        debug!("Opened key-value store at {path}");
        Ok(SqliteStore {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| anyhow!("kv_store connection lock poisoned"))?;
        f(&connection)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare("SELECT value FROM kv_store WHERE key = ?")?;
            statement.bind((1, key))?;
            if let State::Row = statement.next()? {
                Ok(Some(statement.read::<String, _>("value")?))
            } else {
                Ok(None)
            }
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            let mut statement = conn.prepare(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
            )?;
            statement.bind((1, key))?;
            statement.bind((2, value))?;
            statement.bind((3, updated_at.as_str()))?;
            while let State::Row = statement.next()? {}
            Ok(())
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare("DELETE FROM kv_store WHERE key = ?")?;
            statement.bind((1, key))?;
            while let State::Row = statement.next()? {}
            Ok(())
        })
    }
}

/// Process-local store, used in tests and ephemeral sessions
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store wrapper whose operations can be switched to fail
    #[derive(Clone, Default)]
    pub struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_reads: Arc<AtomicBool>,
        pub fail_writes: Arc<AtomicBool>,
    }

    impl FlakyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(anyhow!("storage read unavailable"));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("storage write unavailable"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("storage write unavailable"));
            }
            self.inner.remove(key).await
        }
    }
}

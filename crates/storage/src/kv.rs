//! Key-value store for durable client state
//!
//! This module provides the [`KeyValueStore`] trait that stateful components
//! depend on for persistence, and a sled-backed implementation of it. Sled
//! calls block, so [`KvStore`] runs them on tokio's blocking pool.

use async_trait::async_trait;
use sled::Db;
use std::sync::Arc;
use thiserror::Error;

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend unavailable (used by non-sled implementations)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Durable string key-value store used as a persistence collaborator
///
/// Implementations must be safe to share across tasks. Callers treat every
/// operation as fallible and decide themselves whether a failure matters.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for immediate flush)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "parcel_kv.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Sled-backed key-value store
///
/// Values are stored JSON-encoded. Every write is flushed to disk before the
/// returned future resolves.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl KvStore {
    /// Create a new key-value store with configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);

        if let Some(ms) = config.flush_every_ms {
            db_config = db_config.flush_every_ms(Some(ms));
        }

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, "opened key-value store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create an in-memory key-value store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Store raw bytes under a key, bypassing JSON encoding
    ///
    /// Mostly useful for simulating data written by older builds.
    pub fn set_raw(&self, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Db) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| KvError::Unavailable(format!("storage task failed: {e}")))?
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for KvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let key = key.to_owned();
        self.blocking(move |db| match db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let key = key.to_owned();
        let bytes = serde_json::to_vec(value)?;
        self.blocking(move |db| {
            db.insert(key.as_bytes(), bytes)?;
            db.flush()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let key = key.to_owned();
        self.blocking(move |db| {
            db.remove(key.as_bytes())?;
            db.flush()?;
            Ok(())
        })
        .await
    }
}

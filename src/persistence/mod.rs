// # Persistence
//
// Best-effort mirroring of in-memory state into a durable key-value store.
//
// - **KeyValueStore**: the only thing the core needs from storage (get/set by key)
// - **MemoryStore**: in-process backend with an optional quota
// - **SqliteStore**: durable backend on a single sqlx table
// - **Persistence**: the adapter the rest of the crate talks to. Writes never
//   fail from the caller's point of view and loads never return a
//   partially-valid value.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::StoreLocation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key for the widget ordering snapshot
pub const WIDGETS_KEY: &str = "dashboard-layout";
/// Storage key for the uploaded asset snapshot
pub const ASSETS_KEY: &str = "uploaded-assets";
/// Storage key for the gallery layout mode (plain string, not JSON)
pub const LAYOUT_KEY: &str = "uploads-layout";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// Trait for durable key-value backends (allows swapping SQLite for memory in tests)
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Adapter between typed state and a [`KeyValueStore`].
///
/// Cloning is cheap and all clones write to the same store.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("store", &"<dyn KeyValueStore>")
            .finish()
    }
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Persistence { store }
    }

    /// Open the backend a configuration points at
    pub async fn open(location: &StoreLocation) -> Result<Self, StoreError> {
        let store: Arc<dyn KeyValueStore> = match location {
            StoreLocation::Sqlite(path) => Arc::new(SqliteStore::open(path).await?),
            StoreLocation::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Persistence::new(store))
    }

    /// Serialize `value` as JSON and write it under `key`.
    ///
    /// Serialization and store failures are logged and swallowed: the
    /// caller's in-memory state stays authoritative for the session.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize state, skipping write");
                return;
            }
        };
        self.save_raw(key, &json).await;
    }

    /// Write a plain string value under `key` (same failure policy as [`save`](Self::save))
    pub async fn save_raw(&self, key: &str, value: &str) {
        match self.store.set(key, value).await {
            Ok(()) => debug!(key, bytes = value.len(), "Persisted state"),
            Err(e) => warn!(key, error = %e, "Store rejected write, state kept in memory only"),
        }
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Returns `None` when the key is absent, unreadable, not valid JSON for
    /// `T`, or rejected by `validate`. Nothing is ever written back.
    pub async fn load<T, F>(&self, key: &str, validate: F) -> Option<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let raw = self.load_raw(key).await?;

        let parsed: T = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key, error = %e, "Discarding stored snapshot that failed to parse");
                return None;
            }
        };

        if !validate(&parsed) {
            warn!(key, "Discarding stored snapshot that failed validation");
            return None;
        }

        Some(parsed)
    }

    /// Read the raw string under `key`, treating read errors as absence
    pub async fn load_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from store");
                None
            }
        }
    }
}

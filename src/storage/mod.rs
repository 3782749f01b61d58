//! Durable key-value storage for preferences
//!
//! [`KeyValueStore`] is the only persistence seam in the engine. The
//! [`SledStore`] implementation keeps data in an embedded `sled` database and
//! flushes on every write; [`MemoryStore`] keeps it in process for tests and
//! throwaway sessions.

use crate::error::{Result, VibeError};
use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// String-valued key-value persistence
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Storage` if the backend cannot be read
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Durably store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Storage` if the write or flush fails
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Embedded sled-backed store
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database directory
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use vinylvibe::storage::{KeyValueStore, SledStore};
    ///
    /// # fn main() -> vinylvibe::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledStore::open(dir.path().join("prefs.db"))?;
    /// store.save("greeting", "hello")?;
    /// assert_eq!(store.load("greeting")?, Some("hello".to_string()));
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)
            .map_err(|e| VibeError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!("Opened preference store at {}", path.display());
        Ok(Self { db })
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore").finish_non_exhaustive()
    }
}

impl KeyValueStore for SledStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| VibeError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|e| VibeError::Storage(format!("Stored value is not UTF-8: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| VibeError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| VibeError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one preloaded value
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

//! Durable local key/value storage.
//!
//! Holds the only state that survives a restart: the auth token, the theme
//! mode and the last selected database. Values are read at initialization
//! and written on change.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use common::errors::{AppError, AppResult};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "apiKey";

/// Storage key of the UI theme mode.
pub const THEME_MODE_KEY: &str = "themeMode";

/// Storage key of the last selected database.
pub const SELECTED_DATABASE_KEY: &str = "selectedDatabaseId";

/// Synchronous key/value storage.
pub trait LocalStorage: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object file, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage file. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Stored bearer token, if any.
pub fn token(storage: &dyn LocalStorage) -> Option<String> {
    non_empty(storage.get(TOKEN_KEY))
}

pub fn save_token(storage: &dyn LocalStorage, token: &str) -> AppResult<()> {
    storage.set(TOKEN_KEY, token)
}

pub fn delete_token(storage: &dyn LocalStorage) -> AppResult<()> {
    storage.remove(TOKEN_KEY)
}

/// Last selected database id, if any.
pub fn selected_database_id(storage: &dyn LocalStorage) -> Option<String> {
    non_empty(storage.get(SELECTED_DATABASE_KEY))
}

pub fn save_selected_database_id(storage: &dyn LocalStorage, id: &str) -> AppResult<()> {
    storage.set(SELECTED_DATABASE_KEY, id)
}

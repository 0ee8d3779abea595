//! Small string key/value store with browser local-storage semantics.
//!
//! The API key is the only item the service persists, but callers address it by item name so
//! the file can grow other settings without a format change.
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub trait Storage: Send + Sync {
    fn get_item(&self, name: &str) -> Result<Option<String>>;
    fn set_item(&self, name: &str, value: &str) -> Result<()>;
    fn remove_item(&self, name: &str) -> Result<()>;
}

/// Items stored as one JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} does not hold a JSON object", self.path.display()),
        }
    }

    fn store(&self, items: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(items).context("serializing storage")?;
        fs::write(&self.path, body).with_context(|| format!("writing {}", self.path.display()))
    }

    fn modify(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        let mut items = self.load()?;
        f(&mut items);
        self.store(&items)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>> {
        let items = self.load()?;
        Ok(items
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    fn set_item(&self, name: &str, value: &str) -> Result<()> {
        debug!(item = name, path = %self.path.display(), "Storing item");
        self.modify(|items| {
            items.insert(name.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        debug!(item = name, path = %self.path.display(), "Removing item");
        self.modify(|items| {
            items.remove(name);
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(name: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut items) = storage.items.lock() {
            items.insert(name.to_string(), value.to_string());
        }
        storage
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        Ok(items.get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get_item("tmdb_api_key").unwrap(), None);
    }

    #[test]
    fn file_storage_round_trips_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");
        let storage = FileStorage::new(&path);

        storage.set_item("tmdb_api_key", "abc123").unwrap();
        storage.set_item("other", "value").unwrap();
        assert!(path.exists());

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get_item("tmdb_api_key").unwrap().as_deref(),
            Some("abc123")
        );

        reopened.remove_item("tmdb_api_key").unwrap();
        assert_eq!(storage.get_item("tmdb_api_key").unwrap(), None);
        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn rejects_non_object_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let storage = FileStorage::new(&path);
        assert!(storage.get_item("tmdb_api_key").is_err());
    }

    #[test]
    fn memory_storage_remove_is_idempotent() {
        let storage = MemoryStorage::with_item("k", "v");
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }
}

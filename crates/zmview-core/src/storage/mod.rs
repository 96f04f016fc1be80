//! Opaque key-value persistence for session data.
//!
//! The rest of the crate never touches the filesystem directly: everything
//! that must survive a restart goes through the `Storage` trait as an opaque
//! string blob. `FileStorage` keeps one JSON document per key under a
//! dedicated directory; `MemoryStorage` backs tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::debug;

/// Opaque key-value store.
///
/// Values are JSON documents serialized by the caller; the store never
/// inspects them.
pub trait Storage {
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Remove every key this store manages.
    fn clear(&self) -> Result<()>;
}

/// File-backed store: one `<KEY>.json` file per key under `dir`.
///
/// The directory belongs to this store alone, so `clear` may sweep it.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write storage entry {}", key))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry {}", key))?;
        Ok(Some(contents))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry {}", key))?;
            debug!(key, "removed storage entry");
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list storage directory {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        debug!("cleared storage");
        Ok(())
    }
}

/// In-memory store for tests. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("LOGIN").unwrap(), None);

        storage.set("LOGIN", r#"{"host":"cam.example.com"}"#).unwrap();
        assert_eq!(
            storage.get("LOGIN").unwrap().as_deref(),
            Some(r#"{"host":"cam.example.com"}"#)
        );

        storage.remove("LOGIN").unwrap();
        assert_eq!(storage.get("LOGIN").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_clear_removes_all_keys() {
        let storage = MemoryStorage::new();
        storage.set("LOGIN", "{}").unwrap();
        storage.set("TOKEN", "{}").unwrap();

        storage.clear().unwrap();

        assert_eq!(storage.get("LOGIN").unwrap(), None);
        assert_eq!(storage.get("TOKEN").unwrap(), None);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("zmview-storage-test-{}", std::process::id()));
        let storage = FileStorage::new(&dir).unwrap();

        storage.set("TOKEN", r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(
            storage.get("TOKEN").unwrap().as_deref(),
            Some(r#"{"access_token":"abc"}"#)
        );

        storage.clear().unwrap();
        assert_eq!(storage.get("TOKEN").unwrap(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

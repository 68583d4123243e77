//! Persistent list store
//!
//! A newest-first list of library entries kept in memory and written through
//! to one key of a durable key-value store after every mutation. The whole
//! collection is serialized as a JSON array on each write.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Write failure of a key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is over its quota; nothing was written
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    CapacityExceeded { needed: u64, quota: u64 },

    #[error("failed to write storage: {0}")]
    Write(#[from] io::Error),

    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_capacity(&self) -> bool {
        matches!(self, StoreError::CapacityExceeded { .. })
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        if self.is_capacity() {
            "Storage is full. Delete old entries or clear library data to free up space."
        } else {
            "An error occurred while saving."
        }
    }
}

/// Durable string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key under a directory, with a shared byte quota
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Bytes used by every key except `key`
    fn used_by_others(&self, key: &str) -> io::Result<u64> {
        let own = self.path_for(key);
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut total = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path == own || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let needed = self.used_by_others(key)? + value.len() as u64;
        if needed > self.quota_bytes {
            return Err(StoreError::CapacityExceeded {
                needed,
                quota: self.quota_bytes,
            });
        }

        // Temp file in the same directory, renamed over the target
        let write = || -> io::Result<()> {
            std::fs::create_dir_all(&self.dir)?;
            let mut tmp = NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(value.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
            Ok(())
        };

        match write() {
            Err(e) if e.kind() == io::ErrorKind::StorageFull => Err(StoreError::CapacityExceeded {
                needed,
                quota: self.quota_bytes,
            }),
            other => Ok(other?),
        }
    }
}

/// Process-local store; clones share the same map
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: u64,
}

impl MemoryStore {
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            quota_bytes,
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.data
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let quota = self.quota_bytes;
        let mut data = self.lock()?;
        let others: u64 = data
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len() as u64)
            .sum();
        let needed = others + value.len() as u64;
        if needed > quota {
            return Err(StoreError::CapacityExceeded { needed, quota });
        }
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Entries addressable by a numeric id
pub trait ListItem {
    fn id(&self) -> i64;
}

/// Newest-first list persisted under one namespace key
pub struct ListStore<T, B> {
    key: String,
    backend: B,
    data: Vec<T>,
}

impl<T, B> ListStore<T, B>
where
    T: ListItem + Serialize + DeserializeOwned,
    B: KeyValueStore,
{
    pub fn new(key: impl Into<String>, backend: B) -> Self {
        Self {
            key: key.into(),
            backend,
            data: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the collection from the backend. Unreadable or malformed data is
    /// logged and leaves an empty collection.
    pub fn load(&mut self) -> &[T] {
        match self.backend.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(data) => self.data = data,
                Err(e) => {
                    tracing::warn!("Failed to parse library '{}': {}", self.key, e);
                    self.data = Vec::new();
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to read library '{}': {}", self.key, e);
                self.data = Vec::new();
            }
        }
        &self.data
    }

    /// Write the in-memory collection; on failure the in-memory state is kept
    pub fn save(&mut self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.data)?;
        self.backend.set(&self.key, &raw).inspect_err(|e| {
            tracing::error!("Storage save error for '{}': {}", self.key, e);
        })
    }

    pub fn add(&mut self, item: T) -> Result<(), StoreError> {
        self.data.insert(0, item);
        self.save()
    }

    pub fn remove(&mut self, id: i64) -> Result<(), StoreError> {
        self.data.retain(|item| item.id() != id);
        self.save()
    }

    /// Drop matching entries without persisting; pair with [`ListStore::add`]
    /// to replace an entry.
    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) {
        self.data.retain(|item| !predicate(item));
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.data.clear();
        self.save()
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.data.iter().find(|item| item.id() == id)
    }

    pub fn exists(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.data.iter().any(predicate)
    }

    pub fn get_all(&self) -> &[T] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}

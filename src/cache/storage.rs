//! Key/value storage media for the durable cache stores
//!
//! The shape follows browser Web Storage: string keys, string values, a flat
//! namespace shared by everyone who writes to the area, and a byte quota.
//! [`MemoryStorage`] lives as long as the process; [`FileStorage`] mirrors its
//! contents to a JSON file so they survive a restart.

use crate::error::StorageError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// A flat string key/value storage area
pub trait KeyValueStorage: Send + Sync {
    /// Read a raw value
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a raw value, replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; absent keys are not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Every key in the area, including ones written by other users
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes an item occupies for quota purposes
fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Check a write against the quota, given the area's current usage
fn check_quota(
    quota: Option<usize>,
    used: usize,
    key: &str,
    old_value: Option<&str>,
    new_value: &str,
) -> Result<(), StorageError> {
    let Some(limit) = quota else {
        return Ok(());
    };

    let released = old_value.map(|old| item_size(key, old)).unwrap_or(0);
    let needed = used - released + item_size(key, new_value);
    if needed > limit {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
            limit,
        });
    }
    Ok(())
}

fn poisoned(area: &str) -> StorageError {
    StorageError::Unavailable(format!("{} lock poisoned", area))
}

/// In-process storage area
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Create an unbounded area
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an area limited to `quota_bytes` (keys plus values)
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Create an area with an optional quota
    pub fn with_optional_quota(quota_bytes: Option<usize>) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes,
        }
    }

    /// Bytes currently used
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .map(|items| items.iter().map(|(k, v)| item_size(k, v)).sum())
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, String>>, StorageError> {
        self.items.read().map_err(|_| poisoned("memory storage"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, String>>, StorageError> {
        self.items.write().map_err(|_| poisoned("memory storage"))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.write()?;
        let used = items.iter().map(|(k, v)| item_size(k, v)).sum();
        check_quota(
            self.quota_bytes,
            used,
            key,
            items.get(key).map(String::as_str),
            value,
        )?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.write()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.keys().cloned().collect())
    }
}

/// Storage area persisted to a JSON file.
///
/// Every write rewrites the file (temp file + rename). A write that cannot be
/// persisted is rolled back in memory so the area never claims to hold data
/// the file does not.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl FileStorage {
    /// Open the area stored at `path`, creating it on first write.
    ///
    /// A file that exists but does not parse is logged and ignored; the area
    /// starts empty and the file is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>, quota_bytes: Option<usize>) -> Result<Self, StorageError> {
        let path = path.into();

        let items = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Ignoring unreadable storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        info!("Opened file storage at {} ({} items)", path.display(), items.len());

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota_bytes,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Persisted {} items to {}", items.len(), self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.items.read().map_err(|_| poisoned("file storage"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.items.write().map_err(|_| poisoned("file storage"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.write()?;
        let used = items.iter().map(|(k, v)| item_size(k, v)).sum();
        check_quota(
            self.quota_bytes,
            used,
            key,
            items.get(key).map(String::as_str),
            value,
        )?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.write()?;
        if let Some(old) = items.remove(key) {
            if let Err(e) = self.persist(&items) {
                items.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();

        storage.set_item("theme", "dark").unwrap();
        assert_eq!(storage.get_item("theme").unwrap(), Some("dark".to_string()));
        assert_eq!(storage.keys().unwrap(), vec!["theme".to_string()]);

        storage.remove_item("theme").unwrap();
        storage.remove_item("theme").unwrap();
        assert_eq!(storage.get_item("theme").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_quota() {
        let storage = MemoryStorage::with_quota(16);

        storage.set_item("k1", "12345678").unwrap();
        assert_eq!(storage.used_bytes(), 10);

        let err = storage.set_item("k2", "12345678").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 16, .. }));
        assert_eq!(storage.get_item("k2").unwrap(), None);

        // Replacing an item only counts the difference
        storage.set_item("k1", "1234567890").unwrap();
        assert_eq!(storage.used_bytes(), 12);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tab.json");

        {
            let storage = FileStorage::open(&path, None).unwrap();
            storage.set_item("cache_profile", "{\"name\":\"Ada\"}").unwrap();
            storage.set_item("unrelated", "1").unwrap();
            storage.remove_item("unrelated").unwrap();
        }

        let reopened = FileStorage::open(&path, None).unwrap();
        assert_eq!(
            reopened.get_item("cache_profile").unwrap(),
            Some("{\"name\":\"Ada\"}".to_string())
        );
        assert_eq!(reopened.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_file_storage_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tab.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path, None).unwrap();
        assert!(storage.keys().unwrap().is_empty());

        storage.set_item("a", "b").unwrap();
        let reopened = FileStorage::open(&path, None).unwrap();
        assert_eq!(reopened.get_item("a").unwrap(), Some("b".to_string()));
    }

    #[test]
    fn test_file_storage_quota_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tab.json");

        let storage = FileStorage::open(&path, Some(8)).unwrap();
        assert!(storage.set_item("key", "too long a value").is_err());
        assert!(!path.exists());
    }
}

//! Host key-value storage.
//!
//! Values are strings, reads never fail (a value that cannot be read is absent) and
//! writes may be refused, usually because a quota was exceeded.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use spdlog::warn;

use crate::error::StorageError;

pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str);
}

/// In-process storage. The quota applies to the sum of all stored values.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStorage {
            items: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.items.values().map(|v| v.len()).sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let current = self.items.get(key).map(|v| v.len()).unwrap_or(0);
            let size = self.used_bytes() - current + value.len();
            if size > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), size, quota });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// One `<key>.json` file per key. The quota applies to each value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root_dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn open(root_dir: &Path, quota: Option<usize>) -> io::Result<FileStorage> {
        fs::create_dir_all(root_dir)?;
        Ok(FileStorage {
            root_dir: root_dir.to_path_buf(),
            quota,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let file_name: String = key.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root_dir.join(format!("{}.json", file_name))
    }

    fn write_file(path: &Path, value: &str) -> io::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Unable to read {}: {}", path.to_str().unwrap_or_default(), e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), size: value.len(), quota });
            }
        }

        Self::write_file(&self.key_path(key), value)
            .map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn remove(&mut self, key: &str) {
        let path = self.key_path(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Unable to remove {}: {}", path.to_str().unwrap_or_default(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get("blogs").is_none());
        storage.set("blogs", "[]").unwrap();
        assert_eq!(storage.get("blogs").as_deref(), Some("[]"));
        storage.remove("blogs");
        assert!(storage.get("blogs").is_none());
    }

    #[test]
    fn test_memory_quota_counts_all_keys() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set("a", "12345").unwrap();
        storage.set("b", "12345").unwrap();
        // Replacing a value only counts the new size
        storage.set("b", "1234").unwrap();
        let res = storage.set("c", "12");
        assert!(matches!(res, Err(StorageError::QuotaExceeded { size: 11, quota: 10, .. })));
        assert!(storage.get("c").is_none());
    }

    #[test]
    fn test_file_storage() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(&dir.path().join("data"), None)?;
        assert!(storage.get("blogDraft").is_none());

        storage.set("blogDraft", "{\"title\":\"x\"}").unwrap();
        assert!(dir.path().join("data").join("blogDraft.json").exists());
        assert_eq!(storage.get("blogDraft").as_deref(), Some("{\"title\":\"x\"}"));

        // A second handle on the same directory sees the same data
        let other = FileStorage::open(storage.root_dir(), None)?;
        assert_eq!(other.get("blogDraft").as_deref(), Some("{\"title\":\"x\"}"));

        storage.remove("blogDraft");
        storage.remove("blogDraft");
        assert!(storage.get("blogDraft").is_none());
        Ok(())
    }

    #[test]
    fn test_file_storage_quota() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path(), Some(4))?;
        assert!(storage.set("theme", "dark").is_ok());
        assert!(matches!(storage.set("theme", "light"), Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));
        Ok(())
    }
}

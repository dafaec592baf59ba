//! Durable Storage
//!
//! A minimal string key-value port the cart mirrors itself into. Nothing is
//! assumed about atomicity across keys.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused the write because it is full.
    #[error("storage quota exceeded while writing {0}")]
    QuotaExceeded(String),

    /// The backend has been disabled.
    #[error("storage is disabled")]
    Disabled,

    /// Key cannot be mapped onto the backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying IO failure.
    #[error("storage IO error: {0}")]
    Io(#[from] io::Error),
}

/// String key-value storage.
pub trait Storage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write was rejected.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the delete was rejected.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: FxHashMap<String, String>,
    mode: FailureMode,
}

/// How a [`MemoryStorage`] responds to writes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Reads and writes succeed.
    #[default]
    Healthy,

    /// Writes fail as if the quota were exhausted; reads still succeed.
    QuotaExceeded,

    /// Every operation fails.
    Disabled,
}

impl MemoryStorage {
    /// Create an empty, healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch how subsequent operations behave.
    pub fn set_failure_mode(&mut self, mode: FailureMode) {
        self.mode = mode;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_write(&self, key: &str) -> Result<(), StorageError> {
        match self.mode {
            FailureMode::Healthy => Ok(()),
            FailureMode::QuotaExceeded => Err(StorageError::QuotaExceeded(key.to_string())),
            FailureMode::Disabled => Err(StorageError::Disabled),
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.mode == FailureMode::Disabled {
            return Err(StorageError::Disabled);
        }

        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.entries.remove(key);

        Ok(())
    }
}

/// Storage backed by a directory, one file per key.
///
/// Writes land in a sibling temporary file first and are renamed into place,
/// so a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if necessary) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

        if valid {
            Ok(self.root.join(format!("{key}.json")))
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, value)?;

        if let Err(error) = fs::rename(&staging, &path) {
            _ = fs::remove_file(&staging);
            return Err(error.into());
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_round_trip() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set("cart", "[]")?;

        assert_eq!(storage.get("cart")?, Some("[]".to_string()));
        assert_eq!(storage.get("other")?, None);

        storage.remove("cart")?;
        storage.remove("cart")?;

        assert!(storage.is_empty());

        Ok(())
    }

    #[test]
    fn memory_quota_rejects_writes_but_allows_reads() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.set("cart", "old")?;
        storage.set_failure_mode(FailureMode::QuotaExceeded);

        let result = storage.set("cart", "new");

        assert!(matches!(result, Err(StorageError::QuotaExceeded(key)) if key == "cart"));
        assert_eq!(storage.get("cart")?, Some("old".to_string()));

        Ok(())
    }

    #[test]
    fn memory_disabled_rejects_everything() {
        let mut storage = MemoryStorage::new();
        storage.set_failure_mode(FailureMode::Disabled);

        assert!(matches!(storage.get("cart"), Err(StorageError::Disabled)));
        assert!(matches!(storage.remove("cart"), Err(StorageError::Disabled)));
    }

    #[test]
    fn file_round_trip() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path().join("store"))?;

        assert_eq!(storage.get("trolley.cart")?, None);

        storage.set("trolley.cart", r#"{"version":1}"#)?;
        assert_eq!(
            storage.get("trolley.cart")?,
            Some(r#"{"version":1}"#.to_string())
        );

        storage.set("trolley.cart", "replaced")?;
        assert_eq!(storage.get("trolley.cart")?, Some("replaced".to_string()));

        storage.remove("trolley.cart")?;
        storage.remove("trolley.cart")?;
        assert_eq!(storage.get("trolley.cart")?, None);

        Ok(())
    }

    #[test]
    fn file_values_survive_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;

        FileStorage::open(dir.path())?.set("pending", "snapshot")?;

        let reopened = FileStorage::open(dir.path())?;

        assert_eq!(reopened.get("pending")?, Some("snapshot".to_string()));

        Ok(())
    }

    #[test]
    fn file_rejects_path_like_keys() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path())?;

        for key in ["", "..", "../escape", "a/b", "a\\b"] {
            assert!(
                matches!(storage.set(key, "x"), Err(StorageError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }

        Ok(())
    }

    #[test]
    fn failed_rename_leaves_no_staging_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path())?;

        // A non-empty directory where the value file should go blocks the rename.
        let blocker = dir.path().join("cart.json");
        fs::create_dir(&blocker)?;
        fs::write(blocker.join("keep"), "x")?;

        assert!(matches!(storage.set("cart", "[]"), Err(StorageError::Io(_))));
        assert!(!dir.path().join("cart.json.tmp").exists());

        Ok(())
    }
}

//! File-backed key-value store.
//!
//! One `<key>.json` file per key under the store directory. Writes go
//! through a temp file + rename so a crash mid-write leaves the previous
//! value intact, and take an exclusive advisory lock on a sidecar lockfile
//! so a second process blocks instead of interleaving read-modify-write
//! cycles.

use std::path::PathBuf;

use fs2::FileExt;
use tokio::fs;

use super::{KeyValueStore, StorageError};

/// Durable store rooted at a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created on first use)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open a store, creating the directory eagerly
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir).await?;
        Ok(store)
    }

    /// Path of the blob file for `key`
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }

    /// Take the exclusive write lock for the duration of the guard
    fn write_lock(&self) -> Result<std::fs::File, StorageError> {
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(lock)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(&path).await?))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;
        let lock = self.write_lock()?;

        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;

        FileExt::unlock(&lock).map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(());
        }

        let lock = self.write_lock()?;
        let result = fs::remove_file(&path).await;
        FileExt::unlock(&lock).map_err(|e| StorageError::Lock(e.to_string()))?;

        match result {
            Ok(()) => Ok(()),
            // Lost a race with another remover; the key is gone either way
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

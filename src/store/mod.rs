//! Key-value persistence for braindump collections.
//!
//! The persisted collections (transcripts, tasks) are stored as complete
//! JSON arrays under string keys. Every mutation reads the full collection,
//! transforms it in memory, and writes the full collection back, so the
//! store itself only needs get/set/remove over string blobs.
//!
//! Pipelines take an explicit store handle instead of reaching for ambient
//! global state, which is what makes the test doubles in `memory` possible.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Store key for the transcript collection
pub const TRANSCRIPTS_KEY: &str = "transcripts";

/// Store key for the task collection
pub const TASKS_KEY: &str = "tasks";

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock failed: {0}")]
    Lock(String),

    #[error("Store backend failed: {0}")]
    Backend(String),
}

/// Durable string-keyed JSON blob storage.
///
/// Survives restarts (for the file-backed implementation); keys hold
/// whole collections, never incremental records.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if the key was never set
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the blob under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load a typed collection, treating an unset key as empty
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>, StorageError> {
    match store.get(key).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Write a typed collection back as one JSON array
pub async fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(items)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;

    #[tokio::test]
    async fn test_load_collection_empty_when_unset() {
        let store = MemoryStore::new();

        let tasks: Vec<Task> = load_collection(&store, TASKS_KEY).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_collection_round_trip() {
        let store = MemoryStore::new();
        let tasks = vec![Task::new("Call Brian", "Call Brian tomorrow")];

        save_collection(&store, TASKS_KEY, &tasks).await.unwrap();
        let loaded: Vec<Task> = load_collection(&store, TASKS_KEY).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Call Brian");
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_serialization_error() {
        let store = MemoryStore::new();
        store.set(TASKS_KEY, "not json").await.unwrap();

        let result: Result<Vec<Task>, _> = load_collection(&store, TASKS_KEY).await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}

//! History view: read, update, and delete over the persisted collections.
//!
//! Every mutation is read-full-collection → transform → write-full-
//! collection. The store is single-writer by construction (one CLI
//! process, exclusive write lock in the file backend), so the
//! read-modify-write cycles never interleave.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{Task, Transcript};
use crate::store::{self, KeyValueStore, StorageError, TASKS_KEY, TRANSCRIPTS_KEY};

/// Errors from history operations
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A task index past the end of the collection. The stored
    /// collection is left untouched.
    #[error("task index {index} out of bounds (collection has {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Browsing surface over persisted transcripts and tasks.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Full transcript collection in stored (most-recent-first) order;
    /// empty when nothing has been persisted yet.
    pub async fn list_transcripts(&self) -> Result<Vec<Transcript>, StorageError> {
        store::load_collection(self.store.as_ref(), TRANSCRIPTS_KEY).await
    }

    /// Full task collection in insertion order
    pub async fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        store::load_collection(self.store.as_ref(), TASKS_KEY).await
    }

    /// Delete the entire transcript collection. Irreversible, idempotent,
    /// and never touches tasks. Storage failures are surfaced rather than
    /// logged away.
    #[instrument(skip(self))]
    pub async fn clear_transcripts(&self) -> Result<(), StorageError> {
        self.store.remove(TRANSCRIPTS_KEY).await?;
        info!("transcript collection cleared");
        Ok(())
    }

    /// Flip a task's completion flag, returning the updated task
    pub async fn toggle_task(&self, index: usize) -> Result<Task, HistoryError> {
        self.mutate_task(index, |task| task.completed = !task.completed)
            .await
    }

    /// Replace a task's title and description, returning the updated task
    pub async fn update_task(
        &self,
        index: usize,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task, HistoryError> {
        let title = title.into();
        let description = description.into();
        self.mutate_task(index, move |task| {
            task.title = title;
            task.description = description;
        })
        .await
    }

    /// Remove one task, returning the removed task
    pub async fn delete_task(&self, index: usize) -> Result<Task, HistoryError> {
        let mut tasks = self.list_tasks().await?;
        if index >= tasks.len() {
            return Err(HistoryError::OutOfBounds {
                index,
                len: tasks.len(),
            });
        }

        let removed = tasks.remove(index);
        store::save_collection(self.store.as_ref(), TASKS_KEY, &tasks).await?;

        Ok(removed)
    }

    /// Case-insensitive substring search on title or description.
    /// A derived view; nothing is persisted.
    pub async fn search_tasks(&self, query: &str) -> Result<Vec<Task>, StorageError> {
        let tasks = self.list_tasks().await?;
        Ok(tasks.into_iter().filter(|t| t.matches(query)).collect())
    }

    async fn mutate_task<F>(&self, index: usize, mutate: F) -> Result<Task, HistoryError>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.list_tasks().await?;
        let len = tasks.len();
        let task = tasks
            .get_mut(index)
            .ok_or(HistoryError::OutOfBounds { index, len })?;

        mutate(task);
        let updated = task.clone();
        store::save_collection(self.store.as_ref(), TASKS_KEY, &tasks).await?;

        Ok(updated)
    }
}

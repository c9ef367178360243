//! Task extraction pipeline: transcript text in, persisted task batch out.
//!
//! Extraction is best-effort text-to-structure conversion. The pipeline
//! parses the provider's content as a JSON array of `{title, description}`
//! and appends the stamped batch to the persisted collection; it does not
//! validate that titles are non-empty or de-duplicate against existing
//! tasks, which is a prompt concern on the provider side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::Task;
use crate::providers::{ProviderError, TextToTasks};
use crate::store::{self, KeyValueStore, StorageError, TASKS_KEY};

/// Errors from the task extraction pipeline
#[derive(Debug, Error)]
pub enum TaskExtractionError {
    #[error("task extraction failed: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered, but its content was not a JSON array of
    /// `{title, description}` objects
    #[error("task payload was not a JSON array of {{title, description}}: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("failed to persist tasks: {0}")]
    Storage(#[from] StorageError),
}

impl TaskExtractionError {
    /// HTTP status of the failed provider call, when known
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => e.status(),
            _ => None,
        }
    }
}

/// Shape the provider is instructed to return, one object per task
#[derive(Debug, Deserialize)]
struct TaskDraft {
    title: String,
    description: String,
}

/// Orchestrates derive → parse → stamp → persist for one transcript.
pub struct TaskExtractionPipeline {
    provider: Arc<dyn TextToTasks>,
    store: Arc<dyn KeyValueStore>,
    in_flight: AtomicBool,
}

impl TaskExtractionPipeline {
    pub fn new(provider: Arc<dyn TextToTasks>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether an extraction is currently in flight
    pub fn is_extracting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Derive tasks from `text` and append them, in order, to the
    /// persisted task collection. No tasks are persisted on any failure.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn run(&self, text: &str) -> Result<Vec<Task>, TaskExtractionError> {
        let _guard = InFlightGuard::hold(&self.in_flight);

        let content = self.provider.derive_tasks(text).await?;
        let drafts: Vec<TaskDraft> =
            serde_json::from_str(&content).map_err(TaskExtractionError::InvalidPayload)?;

        let batch: Vec<Task> = drafts
            .into_iter()
            .map(|d| Task::new(d.title, d.description))
            .collect();

        let mut tasks: Vec<Task> = store::load_collection(self.store.as_ref(), TASKS_KEY).await?;
        tasks.extend(batch.iter().cloned());
        store::save_collection(self.store.as_ref(), TASKS_KEY, &tasks).await?;

        info!(count = batch.len(), "task batch persisted");
        Ok(batch)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;

    struct StubTasks {
        content: Result<String, u16>,
    }

    #[async_trait]
    impl TextToTasks for StubTasks {
        async fn derive_tasks(&self, _text: &str) -> Result<String, ProviderError> {
            match &self.content {
                Ok(content) => Ok(content.clone()),
                Err(status) => Err(ProviderError::Status {
                    status: *status,
                    message: "stub failure".to_string(),
                }),
            }
        }
    }

    fn pipeline_with(content: Result<String, u16>, store: Arc<MemoryStore>) -> TaskExtractionPipeline {
        TaskExtractionPipeline::new(Arc::new(StubTasks { content }), store)
    }

    #[tokio::test]
    async fn test_two_task_scenario() {
        let store = Arc::new(MemoryStore::new());
        let content = r#"[
            {"title":"Call Brian","description":"Call Brian tomorrow"},
            {"title":"Buy milk","description":"Buy milk"}
        ]"#;
        let pipeline = pipeline_with(Ok(content.to_string()), store.clone());

        let before = Utc::now();
        let batch = pipeline.run("Call Brian tomorrow. Buy milk.").await.unwrap();
        let after = Utc::now();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].title, "Call Brian");
        assert_eq!(batch[1].title, "Buy milk");
        for task in &batch {
            assert!(!task.completed);
            assert!(task.created_at >= before && task.created_at <= after);
        }

        let persisted: Vec<Task> = store::load_collection(store.as_ref(), TASKS_KEY).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].title, "Call Brian");
        assert_eq!(persisted[1].title, "Buy milk");
    }

    #[tokio::test]
    async fn test_batches_append_after_existing_tasks() {
        let store = Arc::new(MemoryStore::new());
        let existing = vec![Task::new("Existing", "Already here")];
        store::save_collection(store.as_ref(), TASKS_KEY, &existing).await.unwrap();

        let pipeline = pipeline_with(
            Ok(r#"[{"title":"New","description":"Appended"}]"#.to_string()),
            store.clone(),
        );
        pipeline.run("anything").await.unwrap();

        let persisted: Vec<Task> = store::load_collection(store.as_ref(), TASKS_KEY).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].title, "Existing");
        assert_eq!(persisted[1].title, "New");
    }

    #[tokio::test]
    async fn test_provider_failure_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(Err(429), store.clone());

        let result = pipeline.run("anything").await;

        assert!(matches!(result, Err(TaskExtractionError::Provider(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_payload_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(
            Ok("Sure! Here are your tasks: call Brian".to_string()),
            store.clone(),
        );

        let result = pipeline.run("anything").await;

        assert!(matches!(result, Err(TaskExtractionError::InvalidPayload(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_payload_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        // Valid JSON, wrong shape: objects missing `description`
        let pipeline = pipeline_with(Ok(r#"[{"title":"only"}]"#.to_string()), store.clone());

        let result = pipeline.run("anything").await;
        assert!(matches!(result, Err(TaskExtractionError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_empty_array_is_a_valid_empty_batch() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(Ok("[]".to_string()), store.clone());

        let batch = pipeline.run("um, nothing actionable").await.unwrap();

        assert!(batch.is_empty());
        let persisted: Vec<Task> = store::load_collection(store.as_ref(), TASKS_KEY).await.unwrap();
        assert!(persisted.is_empty());
    }
}

//! Transcript records.
//!
//! A transcript is created once per completed transcription and is never
//! mutated afterwards. The persisted collection is kept most-recent-first;
//! deletion happens only through the bulk clear operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;

/// One recognized utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// The recognized text, non-empty on success
    pub text: String,

    /// Capture time, set at save and immutable thereafter
    pub timestamp: DateTime<Utc>,

    /// Tasks derived from this transcript, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

impl Transcript {
    /// Create a transcript stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            tasks: None,
        }
    }

    /// Attach the derived task batch
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }
}

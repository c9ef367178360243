//! Task records.
//!
//! Tasks are created in batches by the extraction pipeline from one
//! transcript's text. Unlike transcripts they stay individually mutable:
//! completion can be toggled, title and description edited, and single
//! tasks deleted. The collection is flat; after creation no back-reference
//! to the originating transcript is enforced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An actionable item derived from a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub title: String,

    pub description: String,

    /// Whether the task has been checked off
    #[serde(default)]
    pub completed: bool,

    /// When the task was created (extraction time, not transcript time)
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an open task stamped with the current time
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            completed: false,
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive substring match on title or description
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

//! Domain types for braindump.
//!
//! This module contains the core data structures:
//! - Transcript: One recognized utterance with its capture time
//! - Task: An actionable item derived from a transcript
//! - User: The authenticated account, as exposed by the auth provider

pub mod task;
pub mod transcript;
pub mod user;

// Re-export commonly used types
pub use task::Task;
pub use transcript::Transcript;
pub use user::{User, UserMetadata};

//! braindump - voice brain-dump capture and task pipeline
//!
//! Record speech, transcribe it through a remote speech-to-text API,
//! optionally transform the transcript into structured action items,
//! and keep both transcripts and tasks browsable locally.
//!
//! # Architecture
//!
//! The system is a thin orchestration layer over external capabilities:
//! - Audio is captured by a `RecordingSession` with a time-boxed countdown
//! - `TranscriptionPipeline` turns one finalized clip into a persisted
//!   transcript (upload → transcribe → prepend to history)
//! - `TaskExtractionPipeline` turns transcript text into a persisted
//!   batch of tasks
//! - `HistoryStore` exposes both collections for listing, editing, and
//!   deletion
//!
//! Every external collaborator (speech-to-text, task derivation, auth,
//! key-value persistence, the microphone) sits behind a narrow trait, so
//! the pipelines run against deterministic fakes in tests.
//!
//! # Modules
//!
//! - `capture`: Recording session, audio sources, clip finalization
//! - `core`: Pipelines, history view, account manager
//! - `domain`: Data structures (Transcript, Task, User)
//! - `providers`: Remote capability traits and HTTP implementations
//! - `store`: Key-value persistence (file-backed and in-memory)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Record up to 120 seconds, transcribe, and extract tasks
//! braindump record --tasks
//!
//! # Browse history
//! braindump transcripts list
//! braindump tasks list
//!
//! # Edit tasks
//! braindump tasks toggle 2
//! braindump tasks search milk
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod providers;
pub mod store;

// Re-export main types at crate root for convenience
pub use capture::{AudioClip, AudioSource, CaptureError, RecordingSession, Tick};
pub use crate::core::{
    AccountManager, HistoryError, HistoryStore, TaskExtractionError, TaskExtractionPipeline,
    TranscriptionError, TranscriptionPipeline,
};
pub use domain::{Task, Transcript, User};
pub use providers::{AuthProvider, SpeechToText, TextToTasks};
pub use store::{KeyValueStore, StorageError};

//! Audio capture: the recording session and its sources.
//!
//! The pieces:
//!
//! 1. **AudioSource**: device abstraction (real microphone vs mock)
//! 2. **RecordingSession**: the `Idle/Recording` state machine with the
//!    time-box countdown; finalizes captures into WAV clips
//!
//! The session has no timer of its own. A driver (the CLI record loop)
//! delivers `tick()` once per second, which keeps the auto-stop behavior
//! testable without wall-clock delays.

pub mod device;
pub mod session;
pub mod source;

use thiserror::Error;

pub use device::MicrophoneSource;
pub use session::{clip_from_file, AudioClip, RecordingSession, Tick};
pub use source::{AudioSource, MockAudioSource};

/// Errors from the capture lifecycle
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Microphone access denied or no input device is visible
    #[error("microphone unavailable: {message}")]
    Permission { message: String },

    /// The capture device exists but could not be acquired or driven
    #[error("audio device error: {message}")]
    Device { message: String },

    /// `start()` while a recording is already active
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// Finalizing the capture into a clip failed; no clip was produced
    #[error("failed to finalize recording: {message}")]
    Finalize { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

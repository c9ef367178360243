//! Transcription pipeline: one finalized clip in, one persisted
//! transcript out.
//!
//! The pipeline either fully completes its persistence side effect or
//! performs none of it: a provider or storage failure leaves the
//! transcript collection exactly as it was. Nothing here retries; a
//! failed run is re-triggered manually by the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::capture::AudioClip;
use crate::domain::Transcript;
use crate::providers::{AudioUpload, ProviderError, SpeechToText};
use crate::store::{self, KeyValueStore, StorageError, TRANSCRIPTS_KEY};

/// Errors from the transcription pipeline
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Provider call failed or returned non-2xx; status available when
    /// the provider answered at all
    #[error("transcription failed: {0}")]
    Provider(#[from] ProviderError),

    /// The clip file could not be read
    #[error("could not read audio clip: {0}")]
    Audio(#[from] std::io::Error),

    #[error("failed to persist transcript: {0}")]
    Storage(#[from] StorageError),
}

impl TranscriptionError {
    /// HTTP status of the failed provider call, when known
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => e.status(),
            _ => None,
        }
    }
}

/// Orchestrates upload → transcribe → persist for one recording.
pub struct TranscriptionPipeline {
    provider: Arc<dyn SpeechToText>,
    store: Arc<dyn KeyValueStore>,
    in_flight: AtomicBool,
}

impl TranscriptionPipeline {
    pub fn new(provider: Arc<dyn SpeechToText>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a transcription is currently in flight.
    ///
    /// Held for the duration of `run` so the caller can disable
    /// conflicting controls; the caller serializes actual calls.
    pub fn is_transcribing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Transcribe one clip and prepend the result to the persisted
    /// transcript collection (most-recent-first).
    #[instrument(skip(self, clip), fields(file = %clip.file_name))]
    pub async fn run(&self, clip: &AudioClip) -> Result<Transcript, TranscriptionError> {
        let _guard = InFlightGuard::hold(&self.in_flight);

        let bytes = tokio::fs::read(&clip.path).await?;
        let upload = AudioUpload {
            bytes,
            file_name: clip.file_name.clone(),
            content_type: clip.content_type.to_string(),
        };

        let text = self.provider.transcribe(upload).await?;
        let transcript = Transcript::new(text);

        let mut transcripts: Vec<Transcript> =
            store::load_collection(self.store.as_ref(), TRANSCRIPTS_KEY).await?;
        transcripts.insert(0, transcript.clone());
        store::save_collection(self.store.as_ref(), TRANSCRIPTS_KEY, &transcripts).await?;

        info!(chars = transcript.text.len(), "transcript persisted");
        Ok(transcript)
    }
}

/// Keeps the in-flight flag set until dropped, on every exit path
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
    use crate::providers::SpeechToText;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use tempfile::TempDir;

    struct StubSpeech {
        result: Result<String, u16>,
    }

    #[async_trait]
    impl SpeechToText for StubSpeech {
        async fn transcribe(&self, _audio: AudioUpload) -> Result<String, ProviderError> {
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(ProviderError::Status {
                    status: *status,
                    message: "stub failure".to_string(),
                }),
            }
        }
    }

    fn stub_clip(temp: &TempDir) -> AudioClip {
        let path = temp.path().join("clip.wav");
        std::fs::write(&path, b"fake wav bytes").unwrap();
        AudioClip {
            path,
            file_name: "clip.wav".to_string(),
            content_type: "audio/wav",
            duration_secs: 3,
        }
    }

    #[tokio::test]
    async fn test_success_prepends_exactly_one_transcript() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let pipeline = TranscriptionPipeline::new(
            Arc::new(StubSpeech {
                result: Ok("first".to_string()),
            }),
            store.clone(),
        );

        let before = Utc::now();
        let transcript = pipeline.run(&stub_clip(&temp)).await.unwrap();
        let after = Utc::now();

        assert_eq!(transcript.text, "first");
        assert!(transcript.timestamp >= before && transcript.timestamp <= after);

        let persisted: Vec<Transcript> =
            store::load_collection(store.as_ref(), TRANSCRIPTS_KEY).await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].text, "first");
    }

    #[tokio::test]
    async fn test_new_transcripts_go_to_the_front() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());

        for text in ["oldest", "newest"] {
            let pipeline = TranscriptionPipeline::new(
                Arc::new(StubSpeech {
                    result: Ok(text.to_string()),
                }),
                store.clone(),
            );
            pipeline.run(&stub_clip(&temp)).await.unwrap();
        }

        let persisted: Vec<Transcript> =
            store::load_collection(store.as_ref(), TRANSCRIPTS_KEY).await.unwrap();
        assert_eq!(persisted[0].text, "newest");
        assert_eq!(persisted[1].text, "oldest");
    }

    #[tokio::test]
    async fn test_provider_failure_persists_nothing() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let pipeline = TranscriptionPipeline::new(
            Arc::new(StubSpeech { result: Err(500) }),
            store.clone(),
        );

        let result = pipeline.run(&stub_clip(&temp)).await;

        assert!(matches!(result, Err(TranscriptionError::Provider(_))));
        assert_eq!(result.unwrap_err().status(), Some(500));

        let persisted: Vec<Transcript> =
            store::load_collection(store.as_ref(), TRANSCRIPTS_KEY).await.unwrap();
        assert!(persisted.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let temp = TempDir::new().unwrap();
        let pipeline = TranscriptionPipeline::new(
            Arc::new(StubSpeech {
                result: Ok("text".to_string()),
            }),
            Arc::new(MemoryStore::new().with_write_failure()),
        );

        let result = pipeline.run(&stub_clip(&temp)).await;
        assert!(matches!(result, Err(TranscriptionError::Storage(_))));
    }

    #[tokio::test]
    async fn test_missing_clip_is_an_audio_error() {
        let pipeline = TranscriptionPipeline::new(
            Arc::new(StubSpeech {
                result: Ok("text".to_string()),
            }),
            Arc::new(MemoryStore::new()),
        );
        let clip = AudioClip {
            path: "/nonexistent/clip.wav".into(),
            file_name: "clip.wav".to_string(),
            content_type: "audio/wav",
            duration_secs: 0,
        };

        let result = pipeline.run(&clip).await;
        assert!(matches!(result, Err(TranscriptionError::Audio(_))));
    }

    #[tokio::test]
    async fn test_in_flight_flag_resets_after_failure() {
        let temp = TempDir::new().unwrap();
        let pipeline = TranscriptionPipeline::new(
            Arc::new(StubSpeech { result: Err(503) }),
            Arc::new(MemoryStore::new()),
        );

        assert!(!pipeline.is_transcribing());
        let _ = pipeline.run(&stub_clip(&temp)).await;
        assert!(!pipeline.is_transcribing());
    }
}

//! Pipeline Integration Tests
//!
//! Drives the full record → transcribe → extract → browse flow against
//! stub providers and an in-memory store, plus the failure paths the
//! persistence guarantees depend on.

use std::sync::Arc;

use async_trait::async_trait;
use braindump::capture::{MockAudioSource, RecordingSession};
use braindump::core::{
    HistoryStore, TaskExtractionError, TaskExtractionPipeline, TranscriptionError,
    TranscriptionPipeline,
};
use braindump::providers::{AudioUpload, ProviderError, SpeechToText, TextToTasks};
use braindump::store::MemoryStore;
use chrono::Utc;
use tempfile::TempDir;

/// Speech-to-text stub: fixed text or fixed HTTP status
struct StubSpeech(Result<&'static str, u16>);

#[async_trait]
impl SpeechToText for StubSpeech {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, ProviderError> {
        assert!(!audio.bytes.is_empty(), "upload carries the clip bytes");
        assert!(!audio.file_name.is_empty());
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(ProviderError::Status {
                status,
                message: "stub".to_string(),
            }),
        }
    }
}

/// Task derivation stub: fixed content payload or fixed HTTP status
struct StubTasks(Result<&'static str, u16>);

#[async_trait]
impl TextToTasks for StubTasks {
    async fn derive_tasks(&self, _text: &str) -> Result<String, ProviderError> {
        match self.0 {
            Ok(content) => Ok(content.to_string()),
            Err(status) => Err(ProviderError::Status {
                status,
                message: "stub".to_string(),
            }),
        }
    }
}

/// Record a short clip with the mock source
fn record_clip(temp: &TempDir) -> braindump::capture::AudioClip {
    let mut session = RecordingSession::new(
        Box::new(MockAudioSource::new().with_samples(vec![9i16; 1600])),
        3,
        temp.path().join("recordings"),
    );
    session.start().unwrap();
    session.tick().unwrap();
    session.stop().unwrap().expect("clip")
}

#[tokio::test]
async fn record_transcribe_extract_browse() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());

    // Record and transcribe
    let clip = record_clip(&temp);
    let transcription = TranscriptionPipeline::new(
        Arc::new(StubSpeech(Ok("Call Brian tomorrow. Buy milk."))),
        store.clone(),
    );
    let transcript = transcription.run(&clip).await.unwrap();
    assert_eq!(transcript.text, "Call Brian tomorrow. Buy milk.");

    // Extract tasks from the transcript text
    let extraction = TaskExtractionPipeline::new(
        Arc::new(StubTasks(Ok(
            r#"[{"title":"Call Brian","description":"Call Brian tomorrow"},{"title":"Buy milk","description":"Buy milk"}]"#,
        ))),
        store.clone(),
    );
    let before = Utc::now();
    let batch = extraction.run(&transcript.text).await.unwrap();
    let after = Utc::now();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].title, "Call Brian");
    assert_eq!(batch[1].title, "Buy milk");
    for task in &batch {
        assert!(!task.completed);
        assert!(task.created_at >= before && task.created_at <= after);
    }

    // Both collections are visible through the history view
    let history = HistoryStore::new(store);
    let transcripts = history.list_transcripts().await.unwrap();
    assert_eq!(transcripts.len(), 1);
    assert_eq!(transcripts[0].text, "Call Brian tomorrow. Buy milk.");

    let tasks = history.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "Call Brian");
    assert_eq!(tasks[1].title, "Buy milk");
}

#[tokio::test]
async fn transcripts_are_most_recent_first() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());

    for text in ["first dump", "second dump"] {
        let clip = record_clip(&temp);
        let pipeline = TranscriptionPipeline::new(Arc::new(StubSpeech(Ok(text))), store.clone());
        pipeline.run(&clip).await.unwrap();
    }

    let history = HistoryStore::new(store);
    let transcripts = history.list_transcripts().await.unwrap();
    assert_eq!(transcripts[0].text, "second dump");
    assert_eq!(transcripts[1].text, "first dump");
}

#[tokio::test]
async fn failed_transcription_leaves_history_unchanged() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());

    // Seed one good transcript
    let clip = record_clip(&temp);
    TranscriptionPipeline::new(Arc::new(StubSpeech(Ok("kept"))), store.clone())
        .run(&clip)
        .await
        .unwrap();

    // A 502 from the provider persists nothing
    let failing = TranscriptionPipeline::new(Arc::new(StubSpeech(Err(502))), store.clone());
    let err = failing.run(&clip).await.unwrap_err();
    assert!(matches!(err, TranscriptionError::Provider(_)));
    assert_eq!(err.status(), Some(502));

    let history = HistoryStore::new(store);
    let transcripts = history.list_transcripts().await.unwrap();
    assert_eq!(transcripts.len(), 1);
    assert_eq!(transcripts[0].text, "kept");
}

#[tokio::test]
async fn failed_extraction_persists_no_tasks() {
    let store = Arc::new(MemoryStore::new());

    // Provider failure
    let err = TaskExtractionPipeline::new(Arc::new(StubTasks(Err(429))), store.clone())
        .run("anything")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskExtractionError::Provider(_)));

    // Chatty non-JSON payload
    let err = TaskExtractionPipeline::new(
        Arc::new(StubTasks(Ok("Here are your tasks!"))),
        store.clone(),
    )
    .run("anything")
    .await
    .unwrap_err();
    assert!(matches!(err, TaskExtractionError::InvalidPayload(_)));

    let history = HistoryStore::new(store);
    assert!(history.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn clearing_transcripts_preserves_tasks() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());

    let clip = record_clip(&temp);
    TranscriptionPipeline::new(Arc::new(StubSpeech(Ok("dump"))), store.clone())
        .run(&clip)
        .await
        .unwrap();
    TaskExtractionPipeline::new(
        Arc::new(StubTasks(Ok(r#"[{"title":"Keep","description":"me"}]"#))),
        store.clone(),
    )
    .run("dump")
    .await
    .unwrap();

    let history = HistoryStore::new(store);
    history.clear_transcripts().await.unwrap();

    assert!(history.list_transcripts().await.unwrap().is_empty());
    let tasks = history.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1, "tasks survive losing their source transcript");
    assert_eq!(tasks[0].title, "Keep");
}

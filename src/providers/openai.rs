//! OpenAI-backed speech-to-text and task-extraction providers.
//!
//! Transcription: POST /v1/audio/transcriptions with a multipart form
//! (binary `file` part tagged with filename and content type, plus a
//! `model` selection field). Task extraction: POST /v1/chat/completions
//! with the task-extraction system instruction; the content of the first
//! choice is handed back raw for the pipeline to parse.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::OpenAiSettings;

use super::{AudioUpload, ProviderError, SpeechToText, TextToTasks};

/// Instruction given to the chat model before the transcript text
const TASKS_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that transforms text into actionable tasks in JSON format. Each task should have a title and description. example: [{\"title\": \"Call Brian\", \"description\": \"Call Brian to discuss the project\"}, {\"title\": \"Take out the trash\", \"description\": \"Take out the trash before 10:00 AM\"}]";

/// Client for both OpenAI endpoints
pub struct OpenAiClient {
    api_base: String,
    api_key: String,
    transcription_model: String,
    tasks_model: String,
    client: reqwest::Client,
}

/// Response from /audio/transcriptions
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Response from /chat/completions
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiClient {
    /// Create a client from resolved settings
    pub fn new(settings: &OpenAiSettings) -> Self {
        Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            transcription_model: settings.transcription_model.clone(),
            tasks_model: settings.tasks_model.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Turn a non-2xx response into a status error carrying the body
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ProviderError::Status {
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, ProviderError> {
        let file_part = Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.transcription_model.clone());

        let response = self
            .client
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let parsed: TranscriptionResponse = response.json().await?;

        Ok(parsed.text)
    }
}

#[async_trait]
impl TextToTasks for OpenAiClient {
    async fn derive_tasks(&self, text: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.tasks_model,
            "messages": [
                { "role": "system", "content": TASKS_SYSTEM_INSTRUCTION },
                { "role": "user", "content": format!("Transform this text into tasks: {}", text) },
            ],
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let parsed: ChatResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("completion has no choices".to_string()))
    }
}

//! Capability interfaces for external services.
//!
//! Each remote collaborator is consumed through a narrow trait so the
//! pipelines can be exercised against deterministic fakes instead of the
//! network:
//!
//! - `SpeechToText`: audio payload → recognized text
//! - `TextToTasks`: free text → raw task-list payload
//! - `AuthProvider`: session issuance and account lifecycle

pub mod openai;
pub mod supabase;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::User;

pub use openai::OpenAiClient;
pub use supabase::SupabaseAuth;

/// Errors from the HTTP model providers
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-2xx status
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body did not have the expected shape
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// The HTTP status, when the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Malformed(_) => None,
        }
    }
}

/// Errors from the auth provider
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials rejected or session operation refused
    #[error("auth provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no active session")]
    NotSignedIn,

    #[error("malformed auth response: {0}")]
    Malformed(String),
}

/// One finalized audio payload ready for upload
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,

    /// Filename tag sent with the multipart part
    pub file_name: String,

    /// MIME type of the payload (e.g. "audio/wav")
    pub content_type: String,
}

/// Converts an audio payload to text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, ProviderError>;
}

/// Converts free text into a task-list payload.
///
/// The returned string is the provider's raw content field; the extraction
/// pipeline owns parsing it as a JSON array of `{title, description}`, so a
/// well-formed HTTP exchange with garbage content is a pipeline-level
/// failure, not a provider one.
#[async_trait]
pub trait TextToTasks: Send + Sync {
    async fn derive_tasks(&self, text: &str) -> Result<String, ProviderError>;
}

/// Session issuance and account lifecycle.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
    ) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The user behind the current session, `None` when signed out
    async fn current_user(&self) -> Result<Option<User>, AuthError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError>;
}

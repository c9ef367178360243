//! Supabase auth provider.
//!
//! Endpoints:
//! - POST /auth/v1/token?grant_type=password  (sign in)
//! - POST /auth/v1/signup                     (sign up, first name in `data`)
//! - POST /auth/v1/logout                     (sign out)
//! - GET  /auth/v1/user                       (current user)
//! - DELETE <functions>/delete-user           (account deletion edge function)
//!
//! The access token lives inside the client for the lifetime of the
//! process; nothing is persisted by this crate.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::SupabaseSettings;
use crate::domain::User;

use super::{AuthError, AuthProvider};

/// Supabase REST auth client
pub struct SupabaseAuth {
    base_url: String,
    anon_key: String,
    functions_url: String,
    client: reqwest::Client,
    access_token: Mutex<Option<String>>,
}

/// Session payload returned by token and signup endpoints
#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    access_token: Option<String>,
    user: Option<User>,
}

/// Error body shape used by the auth endpoints
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "msg", alias = "error_description", alias = "error")]
    message: Option<String>,
}

impl SupabaseAuth {
    /// Create a client from resolved settings
    pub fn new(settings: &SupabaseSettings) -> Self {
        Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            functions_url: settings.functions_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            access_token: Mutex::new(None),
        }
    }

    fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.access_token.lock().expect("token lock poisoned").clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.access_token.lock().expect("token lock poisoned") = token;
    }

    /// Map a non-2xx response to a provider error with the body's message
    async fn provider_error(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message.unwrap_or_default(),
            Err(_) => String::new(),
        };

        AuthError::Provider { status, message }
    }

    /// Accept a session payload, remember its token, and extract the user
    fn accept_session(&self, session: SessionResponse) -> Result<User, AuthError> {
        if session.access_token.is_some() {
            self.set_token(session.access_token);
        }

        session
            .user
            .ok_or_else(|| AuthError::Malformed("session without user".to_string()))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self
            .client
            .post(self.auth_endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let session: SessionResponse = response.json().await?;
        self.accept_session(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
    ) -> Result<User, AuthError> {
        let response = self
            .client
            .post(self.auth_endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "first_name": first_name },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let session: SessionResponse = response.json().await?;
        self.accept_session(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.token().ok_or(AuthError::NotSignedIn)?;

        let response = self
            .client
            .post(self.auth_endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        // The session is gone locally even if the revoke call failed
        self.set_token(None);

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.auth_endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        // An expired or revoked token means "signed out", not a failure
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.set_token(None);
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let user: User = response.json().await?;
        Ok(Some(user))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        let response = self
            .client
            .delete(format!("{}/delete-user", self.functions_url))
            .bearer_auth(&self.anon_key)
            .json(&serde_json::json!({ "user_id": user_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        self.set_token(None);
        Ok(())
    }
}

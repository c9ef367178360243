//! Authenticated user, as issued by the auth provider.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    pub email: String,

    /// Free-form profile data attached at sign-up
    #[serde(default)]
    pub metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

impl User {
    /// Display name for greeting: first name when present, email otherwise
    pub fn display_name(&self) -> &str {
        self.metadata
            .first_name
            .as_deref()
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_provider_shape() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "email": "ada@example.com",
            "metadata": {"first_name": "Ada"}
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.display_name(), "Ada");
    }

    #[test]
    fn test_metadata_optional() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "email": "ada@example.com"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert!(user.metadata.first_name.is_none());
        assert_eq!(user.display_name(), "ada@example.com");
    }
}

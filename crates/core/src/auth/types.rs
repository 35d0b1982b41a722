use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::email_to_name;

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
        }
    }
}

/// Identity record as returned by the auth server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to greet the user with.
    ///
    /// Prefers the provider's `full_name`/`name` metadata, then the local part
    /// of the email address.
    pub fn display_name(&self) -> String {
        ["full_name", "name"]
            .iter()
            .find_map(|key| self.user_metadata.get(key).and_then(|v| v.as_str()))
            .map(String::from)
            .unwrap_or_else(|| email_to_name(self.email.as_deref().unwrap_or_default()))
    }
}

/// Tokens issued by the auth server for a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The caller's authentication state for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User, session: Session) -> Self {
        Self {
            user: Some(user),
            session: Some(session),
        }
    }
}

/// A request cookie, exposed to pages as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parameters for starting an OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSignIn {
    pub provider: OAuthProvider,
    /// Where the provider sends the user back to after consent.
    pub redirect_to: Url,
}

/// Result of starting an OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthInitiation {
    pub provider: OAuthProvider,
    pub url: Option<Url>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(email: Option<&str>, metadata: serde_json::Value) -> User {
        User {
            id: Uuid::new_v4(),
            aud: "authenticated".to_string(),
            role: None,
            email: email.map(String::from),
            app_metadata: serde_json::Value::Null,
            user_metadata: metadata,
            created_at: None,
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        let user = user_with(
            Some("ada@example.com"),
            serde_json::json!({ "full_name": "Ada Lovelace", "name": "Ada" }),
        );
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = user_with(Some("ada@example.com"), serde_json::Value::Null);
        assert_eq!(user.display_name(), "ada");
    }

    #[test]
    fn display_name_without_email() {
        let user = user_with(None, serde_json::json!({}));
        assert_eq!(user.display_name(), "User");
    }

    #[test]
    fn session_deserializes_gotrue_payload() {
        let payload = serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": {
                "id": "8d0fd2b4-3a54-4bd6-9b4d-6f0c2b1e6a11",
                "aud": "authenticated",
                "email": "ada@example.com"
            }
        });

        let session: Session = serde_json::from_value(payload).unwrap();
        assert_eq!(session.token_type, "bearer");
        assert_eq!(session.expires_at, None);
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn provider_display_is_lowercase() {
        assert_eq!(OAuthProvider::Google.to_string(), "google");
    }
}

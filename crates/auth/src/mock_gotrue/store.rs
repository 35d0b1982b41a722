//! In-memory users, codes and tokens for the mock server.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use gatehouse_core::auth::{Session, User};
use oauth2::{PkceCodeChallenge, PkceCodeVerifier};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default access token lifetime, matching GoTrue's default.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// PKCE verifiers are 43 to 128 characters long (RFC 7636).
const VERIFIER_LENGTH: std::ops::RangeInclusive<usize> = 43..=128;

#[derive(Debug, Clone)]
struct PendingCode {
    email: String,
    code_challenge: String,
}

#[derive(Debug, Clone)]
struct AccessGrant {
    email: String,
    expires_at: i64,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, User>,
    codes: HashMap<String, PendingCode>,
    access_tokens: HashMap<String, AccessGrant>,
    refresh_tokens: HashMap<String, String>,
    fail_sign_outs: bool,
}

/// Shared state behind the mock server's handlers.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<RwLock<Inner>>,
}

fn token(kind: &str) -> String {
    format!("mock-{kind}-{}", Uuid::new_v4().simple())
}

fn new_user(email: &str, name: Option<&str>) -> User {
    let mut metadata = serde_json::json!({ "email": email, "provider": "google" });
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        metadata["full_name"] = serde_json::Value::from(name);
    }

    User {
        id: Uuid::new_v4(),
        aud: "authenticated".to_string(),
        role: Some("authenticated".to_string()),
        email: Some(email.to_string()),
        app_metadata: serde_json::json!({ "provider": "google", "providers": ["google"] }),
        user_metadata: metadata,
        created_at: Some(Utc::now()),
    }
}

impl Inner {
    fn user(&mut self, email: &str, name: Option<&str>) -> User {
        self.users
            .entry(email.to_string())
            .or_insert_with(|| new_user(email, name))
            .clone()
    }

    fn mint_session(&mut self, email: &str, ttl_secs: i64) -> Session {
        let user = self.user(email, None);
        let access_token = token("access");
        let refresh_token = token("refresh");
        let expires_at = (Utc::now() + Duration::seconds(ttl_secs)).timestamp();

        self.access_tokens.insert(
            access_token.clone(),
            AccessGrant {
                email: email.to_string(),
                expires_at,
            },
        );
        self.refresh_tokens
            .insert(refresh_token.clone(), email.to_string());

        Session {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: ttl_secs,
            expires_at: Some(expires_at),
            user,
        }
    }
}

impl MockStore {
    /// Sign `email` in directly, skipping the consent page.
    pub async fn issue_session(&self, email: &str, ttl_secs: i64) -> Session {
        self.inner.write().await.mint_session(email, ttl_secs)
    }

    /// Record a consent and hand back the authorization code for it.
    pub async fn create_code(
        &self,
        email: &str,
        name: Option<&str>,
        code_challenge: &str,
    ) -> String {
        let mut inner = self.inner.write().await;
        inner.user(email, name);

        let code = Uuid::new_v4().to_string();
        inner.codes.insert(
            code.clone(),
            PendingCode {
                email: email.to_string(),
                code_challenge: code_challenge.to_string(),
            },
        );
        code
    }

    /// Redeem a code once, checking the PKCE verifier against its challenge.
    pub async fn redeem_code(&self, code: &str, code_verifier: &str) -> Option<Session> {
        let mut inner = self.inner.write().await;
        let pending = inner.codes.remove(code)?;
        if !VERIFIER_LENGTH.contains(&code_verifier.len()) {
            return None;
        }

        let verifier = PkceCodeVerifier::new(code_verifier.to_string());
        let challenge = PkceCodeChallenge::from_code_verifier_sha256(&verifier);
        if challenge.as_str() != pending.code_challenge {
            return None;
        }

        Some(inner.mint_session(&pending.email, DEFAULT_TTL_SECS))
    }

    /// Rotate a refresh token into a new session.
    pub async fn refresh(&self, refresh_token: &str) -> Option<Session> {
        let mut inner = self.inner.write().await;
        let email = inner.refresh_tokens.remove(refresh_token)?;
        Some(inner.mint_session(&email, DEFAULT_TTL_SECS))
    }

    /// The user behind a live access token.
    pub async fn user_for_token(&self, access_token: &str) -> Option<User> {
        let inner = self.inner.read().await;
        let grant = inner.access_tokens.get(access_token)?;
        if grant.expires_at <= Utc::now().timestamp() {
            return None;
        }
        inner.users.get(&grant.email).cloned()
    }

    /// Revoke every token of the user behind `access_token`.
    pub async fn revoke(&self, access_token: &str) -> bool {
        let mut inner = self.inner.write().await;
        let Some(grant) = inner.access_tokens.remove(access_token) else {
            return false;
        };
        inner.access_tokens.retain(|_, g| g.email != grant.email);
        inner.refresh_tokens.retain(|_, email| *email != grant.email);
        true
    }

    pub async fn set_fail_sign_outs(&self, fail: bool) {
        self.inner.write().await.fail_sign_outs = fail;
    }

    pub async fn fail_sign_outs(&self) -> bool {
        self.inner.read().await.fail_sign_outs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_resolves_to_user() {
        let store = MockStore::default();
        let session = store.issue_session("ada@example.com", 60).await;

        let user = store.user_for_token(&session.access_token).await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user, session.user);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let store = MockStore::default();
        let session = store.issue_session("ada@example.com", -1).await;

        assert!(store.user_for_token(&session.access_token).await.is_none());
    }

    #[tokio::test]
    async fn same_email_keeps_same_user() {
        let store = MockStore::default();
        let first = store.issue_session("ada@example.com", 60).await;
        let second = store.issue_session("ada@example.com", 60).await;

        assert_eq!(first.user.id, second.user.id);
        assert_ne!(first.access_token, second.access_token);
    }

    #[tokio::test]
    async fn code_redeems_once_with_matching_verifier() {
        let store = MockStore::default();
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let code = store
            .create_code("ada@example.com", Some("Ada"), challenge.as_str())
            .await;

        let session = store.redeem_code(&code, verifier.secret()).await.unwrap();
        assert_eq!(session.user.display_name(), "Ada");
        assert!(store.redeem_code(&code, verifier.secret()).await.is_none());
    }

    #[tokio::test]
    async fn code_rejects_wrong_verifier() {
        let store = MockStore::default();
        let (challenge, _verifier) = PkceCodeChallenge::new_random_sha256();
        let code = store
            .create_code("ada@example.com", None, challenge.as_str())
            .await;

        assert!(store.redeem_code(&code, &"w".repeat(43)).await.is_none());
    }

    #[tokio::test]
    async fn code_rejects_verifier_of_invalid_length() {
        let store = MockStore::default();
        let (challenge, _verifier) = PkceCodeChallenge::new_random_sha256();

        for verifier in ["short".to_string(), "v".repeat(129)] {
            let code = store
                .create_code("ada@example.com", None, challenge.as_str())
                .await;
            assert!(store.redeem_code(&code, &verifier).await.is_none());
        }
    }

    #[tokio::test]
    async fn refresh_rotates_token() {
        let store = MockStore::default();
        let session = store.issue_session("ada@example.com", 60).await;

        let fresh = store.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(fresh.refresh_token, session.refresh_token);
        assert!(store.refresh(&session.refresh_token).await.is_none());
    }

    #[tokio::test]
    async fn revoke_kills_all_user_tokens() {
        let store = MockStore::default();
        let first = store.issue_session("ada@example.com", 60).await;
        let second = store.issue_session("ada@example.com", 60).await;
        let other = store.issue_session("bob@example.com", 60).await;

        assert!(store.revoke(&first.access_token).await);

        assert!(store.user_for_token(&second.access_token).await.is_none());
        assert!(store.refresh(&second.refresh_token).await.is_none());
        assert!(store.user_for_token(&other.access_token).await.is_some());
        assert!(!store.revoke(&first.access_token).await);
    }
}

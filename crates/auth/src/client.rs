//! HTTP client for the GoTrue auth server behind Supabase.

use chrono::Utc;
use gatehouse_core::auth::{stamp_expiry, AuthError, OAuthProvider, Result, Session, User};
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use url::Url;

use crate::config::AuthConfig;

/// Client for the `/auth/v1` endpoints.
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

/// Error payloads GoTrue uses across versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

impl GoTrueClient {
    /// Create a client for the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        // Redirects from the auth server are meant for browsers, not for us
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("/auth/v1/{path}"))
            .map_err(|e| AuthError::InvalidRedirect(e.to_string()))
    }

    /// Build the URL that starts an OAuth flow with PKCE.
    ///
    /// No request is made: the browser follows this URL.
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
        code_challenge: &str,
    ) -> Result<Url> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", &provider.to_string())
            .append_pair("redirect_to", redirect_to.as_str())
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    /// Fetch the user an access token belongs to. Validates the token server-side.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        let request = self
            .http
            .get(self.endpoint("user")?)
            .header(AUTHORIZATION, format!("Bearer {access_token}"));
        self.send_json(request).await
    }

    /// Exchange an authorization code from the OAuth callback for a session.
    pub async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<Session> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }

    /// Trade a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    /// Revoke the session an access token belongs to (all devices).
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let mut url = self.endpoint("logout")?;
        url.query_pairs_mut().append_pair("scope", "global");

        let request = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"));
        self.send(request).await.map(|_| ())
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let session: Session = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(stamp_expiry(session, Utc::now()))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(AuthError::Api {
            status: status.as_u16(),
            message: body
                .into_message()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        })
    }
}

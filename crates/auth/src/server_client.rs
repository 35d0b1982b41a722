//! Request-scoped auth client.
//!
//! Wraps the shared [`GoTrueClient`] with the request's cookie jar, the way a
//! Supabase server client is created per request. Session reads and writes go
//! through the jar; handlers return [`ServerClient::into_jar`] so the changes
//! land in the response.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use gatehouse_core::auth::{
    is_ignorable_sign_out_error, is_session_expiring, AuthError, CookiePair, CookieSource,
    IdentityClient, OAuthInitiation, OAuthSignIn, Result, Session, SessionAccessor,
    SessionContext,
};
use oauth2::PkceCodeChallenge;

use crate::client::GoTrueClient;
use crate::config::AuthConfig;
use crate::cookies::{
    decode_session, encode_session, read_chunked, remove_chunked, removal_cookie,
    request_cookies, verifier_cookie, write_chunked,
};
use crate::AuthState;

/// Refresh access tokens this many seconds before they expire.
const EXPIRY_MARGIN_SECS: i64 = 10;

pub struct ServerClient {
    client: Arc<GoTrueClient>,
    config: Arc<AuthConfig>,
    /// Cookie header pairs in order, first duplicate wins.
    request_cookies: Vec<CookiePair>,
    /// The jar as it arrived, to tell which cookies this request changed.
    original: CookieJar,
    jar: Mutex<CookieJar>,
}

impl ServerClient {
    pub fn new(state: &AuthState, headers: &HeaderMap) -> Self {
        let original = CookieJar::from_headers(headers);
        Self {
            client: state.client.clone(),
            config: state.config.clone(),
            request_cookies: request_cookies(headers),
            jar: Mutex::new(original.clone()),
            original,
        }
    }

    /// Request cookies in header order, with this request's changes applied.
    ///
    /// Removed cookies are dropped, rewritten ones carry their new value and
    /// new ones follow the request's cookies, sorted by name.
    pub fn cookies(&self) -> Vec<CookiePair> {
        let jar = self.jar();
        let value = |jar: &CookieJar, name: &str| jar.get(name).map(|c| c.value().to_string());

        let mut pairs: Vec<CookiePair> = self
            .request_cookies
            .iter()
            .filter_map(|pair| {
                let current = value(&jar, &pair.name)?;
                if value(&self.original, &pair.name).as_deref() == Some(current.as_str()) {
                    Some(pair.clone())
                } else {
                    Some(CookiePair::new(&pair.name, current))
                }
            })
            .collect();

        let mut added: Vec<CookiePair> = jar
            .iter()
            .filter(|cookie| self.original.get(cookie.name()).is_none())
            .map(|cookie| CookiePair::new(cookie.name(), cookie.value()))
            .collect();
        added.sort_by(|a, b| a.name.cmp(&b.name));

        pairs.extend(added);
        pairs
    }

    /// The jar with every cookie change made during this request.
    pub fn into_jar(self) -> CookieJar {
        self.jar.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn jar(&self) -> CookieJar {
        self.jar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) {
        let mut guard = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = f(std::mem::take(&mut *guard));
    }

    /// The session in the cookie, without checking it with the auth server.
    fn stored_session(&self) -> Option<Session> {
        let raw = read_chunked(&self.jar(), &self.config.cookie_name)?;
        match decode_session(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring undecodable session cookie");
                None
            }
        }
    }

    fn store_session(&self, session: &Session) -> Result<()> {
        let value = encode_session(session)?;
        let secure = self.config.cookie_secure;
        self.update(|jar| write_chunked(jar, &self.config.cookie_name, &value, secure));
        Ok(())
    }

    fn clear_session(&self) {
        let verifier = self.config.verifier_cookie_name();
        self.update(|jar| {
            let jar = remove_chunked(jar, &self.config.cookie_name);
            if jar.get(&verifier).is_some() {
                jar.remove(removal_cookie(verifier))
            } else {
                jar
            }
        });
    }

    /// The stored session, refreshed when its access token is about to expire.
    async fn current_session(&self) -> Option<Session> {
        let session = self.stored_session()?;
        if !is_session_expiring(&session, Utc::now(), EXPIRY_MARGIN_SECS) {
            return Some(session);
        }

        match self.client.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                if let Err(e) = self.store_session(&fresh) {
                    tracing::warn!(error = %e, "Failed to store refreshed session");
                }
                tracing::debug!(user_id = %fresh.user.id, "Refreshed session");
                Some(fresh)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Session refresh failed, clearing cookies");
                self.clear_session();
                None
            }
        }
    }

    /// Finish a PKCE OAuth flow: trade the callback code for a session cookie.
    ///
    /// # Errors
    ///
    /// Returns `PkceVerifierMissing` if sign-in was not started from this browser,
    /// or the auth server's error if the exchange fails.
    pub async fn exchange_code_for_session(&self, auth_code: &str) -> Result<Session> {
        let verifier_name = self.config.verifier_cookie_name();
        let verifier = self
            .jar()
            .get(&verifier_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AuthError::PkceVerifierMissing)?;

        let session = self.client.exchange_code(auth_code, &verifier).await?;
        self.store_session(&session)?;
        self.update(|jar| jar.remove(removal_cookie(verifier_name)));
        Ok(session)
    }
}

#[async_trait]
impl SessionAccessor for ServerClient {
    async fn safe_get_session(&self) -> SessionContext {
        let Some(session) = self.current_session().await else {
            return SessionContext::anonymous();
        };

        // The cookie alone can be forged; only the auth server can vouch for it
        match self.client.get_user(&session.access_token).await {
            Ok(user) => SessionContext::authenticated(user, session),
            Err(e) => {
                tracing::debug!(error = %e, "Session rejected by auth server");
                SessionContext::anonymous()
            }
        }
    }
}

impl CookieSource for ServerClient {
    fn get_all(&self) -> Vec<CookiePair> {
        self.cookies()
    }
}

#[async_trait]
impl IdentityClient for ServerClient {
    async fn sign_in_with_oauth(&self, request: &OAuthSignIn) -> Result<OAuthInitiation> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let url = self
            .client
            .authorize_url(request.provider, &request.redirect_to, challenge.as_str())?;

        let name = self.config.verifier_cookie_name();
        let secure = self.config.cookie_secure;
        self.update(|jar| jar.add(verifier_cookie(name, verifier.secret().to_string(), secure)));

        Ok(OAuthInitiation {
            provider: request.provider,
            url: Some(url),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.stored_session() {
            if let Err(e) = self.client.logout(&session.access_token).await {
                if !is_ignorable_sign_out_error(&e) {
                    return Err(e);
                }
                tracing::debug!(error = %e, "Session already gone on auth server");
            }
        }

        self.clear_session();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use gatehouse_core::auth::OAuthProvider;
    use url::Url;

    fn state() -> AuthState {
        // Nothing listens here; tests in this module never reach the network
        let config = AuthConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            "anon-key",
            Url::parse("http://localhost:3000").unwrap(),
        )
        .with_cookie_secure(false);
        AuthState::new(config).unwrap()
    }

    fn cookie_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous() {
        let client = ServerClient::new(&state(), &HeaderMap::new());
        assert_eq!(client.safe_get_session().await, SessionContext::anonymous());
    }

    #[tokio::test]
    async fn garbage_cookie_is_anonymous() {
        let state = state();
        let headers = cookie_header(&format!("{}=base64-!!!", state.config.cookie_name));
        let client = ServerClient::new(&state, &headers);

        assert_eq!(client.safe_get_session().await, SessionContext::anonymous());
    }

    #[tokio::test]
    async fn sign_in_stores_verifier_and_returns_authorize_url() {
        let state = state();
        let client = ServerClient::new(&state, &HeaderMap::new());
        let request = OAuthSignIn {
            provider: OAuthProvider::Google,
            redirect_to: Url::parse("http://localhost:3000/auth/callback").unwrap(),
        };

        let initiation = client.sign_in_with_oauth(&request).await.unwrap();

        let url = initiation.url.unwrap();
        assert_eq!(url.path(), "/auth/v1/authorize");
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "code_challenge" && !v.is_empty()));

        let jar = client.into_jar();
        let verifier = jar.get(&state.config.verifier_cookie_name()).unwrap();
        assert!(verifier.value().len() >= 43);
    }

    #[tokio::test]
    async fn sign_out_without_session_succeeds_and_clears() {
        let state = state();
        let headers = cookie_header(&format!(
            "{}=stale-verifier",
            state.config.verifier_cookie_name()
        ));
        let client = ServerClient::new(&state, &headers);

        client.sign_out().await.unwrap();

        let jar = client.into_jar();
        assert!(jar.get(&state.config.verifier_cookie_name()).is_none());
    }

    #[tokio::test]
    async fn exchange_without_verifier_fails() {
        let client = ServerClient::new(&state(), &HeaderMap::new());

        let result = client.exchange_code_for_session("code").await;
        assert!(matches!(result, Err(AuthError::PkceVerifierMissing)));
    }

    #[test]
    fn cookies_keep_request_order() {
        let headers = cookie_header("theme=dark; lang=en; theme=light");
        let client = ServerClient::new(&state(), &headers);

        assert_eq!(
            client.cookies(),
            vec![CookiePair::new("theme", "dark"), CookiePair::new("lang", "en")]
        );
    }

    #[tokio::test]
    async fn cookies_reflect_changes_made_during_the_request() {
        let state = state();
        let headers = cookie_header(&format!(
            "theme=dark; {}=stale-verifier; lang=en",
            state.config.verifier_cookie_name()
        ));
        let client = ServerClient::new(&state, &headers);

        // Drops the stale verifier
        client.sign_out().await.unwrap();
        assert_eq!(
            client.cookies(),
            vec![CookiePair::new("theme", "dark"), CookiePair::new("lang", "en")]
        );

        // A fresh one takes the slot the request's verifier had
        let request = OAuthSignIn {
            provider: OAuthProvider::Google,
            redirect_to: Url::parse("http://localhost:3000/auth/callback").unwrap(),
        };
        client.sign_in_with_oauth(&request).await.unwrap();

        let cookies = client.get_all();
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[1].name, state.config.verifier_cookie_name());
        assert_ne!(cookies[1].value, "stale-verifier");
        assert_eq!(cookies[2], CookiePair::new("lang", "en"));
    }
}

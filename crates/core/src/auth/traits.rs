use async_trait::async_trait;

use super::{AuthError, CookiePair, OAuthInitiation, OAuthSignIn, SessionContext};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Request-scoped access to the caller's session.
#[async_trait]
pub trait SessionAccessor: Send + Sync {
    /// Returns the validated session for the current request.
    ///
    /// Never fails: a missing, expired or rejected session comes back as an
    /// anonymous context.
    async fn safe_get_session(&self) -> SessionContext;
}

/// Abstraction over the identity provider's client.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Start an OAuth sign-in and return the provider URL to send the user to.
    async fn sign_in_with_oauth(&self, request: &OAuthSignIn) -> Result<OAuthInitiation>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;
}

/// The request's cookies as pages see them.
pub trait CookieSource: Send + Sync {
    /// Every cookie in request order, with changes made during the request applied.
    fn get_all(&self) -> Vec<CookiePair>;
}

impl CookieSource for Vec<CookiePair> {
    fn get_all(&self) -> Vec<CookiePair> {
        self.clone()
    }
}

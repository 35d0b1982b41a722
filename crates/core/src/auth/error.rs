use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to reach auth server: {0}")]
    Transport(String),

    #[error("invalid auth server response: {0}")]
    InvalidResponse(String),

    #[error("auth session missing")]
    SessionMissing,

    #[error("PKCE code verifier not found")]
    PkceVerifierMissing,

    #[error("invalid session cookie: {0}")]
    InvalidCookie(String),

    #[error("invalid redirect URL: {0}")]
    InvalidRedirect(String),
}

impl AuthError {
    /// HTTP status reported by the auth server, if the error came from it.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

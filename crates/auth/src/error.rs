use thiserror::Error;

/// Auth errors for the gatehouse_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for setup that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (auth server calls, cookies, etc.)
    #[error(transparent)]
    Core(#[from] gatehouse_core::auth::AuthError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

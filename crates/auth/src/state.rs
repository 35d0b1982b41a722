//! Application state for auth.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::client::GoTrueClient;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub client: Arc<GoTrueClient>,
    pub config: Arc<AuthConfig>,
}

impl AuthState {
    /// Creates a new AuthState for the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let client = GoTrueClient::new(&config)?;
        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
        })
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}

//! Shared application state.

use gatehouse_auth::AuthState;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
}

impl AppState {
    pub fn new(auth: AuthState) -> Self {
        Self { auth }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}

//! Axum extractors for authentication.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{AuthState, ServerClient};

/// Builds a request-scoped client over the request's cookies.
///
/// Handlers must return `client.into_jar()` so cookie changes reach the browser.
impl<S> FromRequestParts<S> for ServerClient
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(ServerClient::new(&auth_state, &parts.headers))
    }
}

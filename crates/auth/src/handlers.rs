//! HTTP handlers for auth routes.

use axum::{extract::Query, response::Redirect, routing::get, Router};
use axum_extra::extract::CookieJar;
use gatehouse_core::auth::validate_return_to;
use gatehouse_core::gate::{CALLBACK_PATH, ROOT_PATH};
use serde::Deserialize;

use crate::{AuthState, ServerClient};

/// Query parameters for the OAuth callback.
///
/// The auth server sends either `code` or `error`/`error_description`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Path to land on after sign-in.
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Creates the auth router.
///
/// Routes:
/// - `GET /auth/callback` - Finish the OAuth flow and set the session cookie
pub fn auth_routes() -> Router<AuthState> {
    Router::new().route(CALLBACK_PATH, get(oauth_callback))
}

async fn oauth_callback(
    client: ServerClient,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let location = complete_sign_in(&client, query).await;
    (client.into_jar(), Redirect::to(&location))
}

/// Returns where to send the browser next. Failures land on the sign-in page.
async fn complete_sign_in(client: &ServerClient, query: CallbackQuery) -> String {
    if let Some(error) = query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "OAuth provider returned an error"
        );
        return ROOT_PATH.to_string();
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback without a code");
        return ROOT_PATH.to_string();
    };

    match client.exchange_code_for_session(&code).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "User signed in");
            query
                .next
                .as_deref()
                .and_then(validate_return_to)
                .unwrap_or(ROOT_PATH)
                .to_string()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OAuth code for session");
            ROOT_PATH.to_string()
        }
    }
}

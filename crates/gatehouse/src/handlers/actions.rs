//! Root page form actions (`POST /?/<name>`).

use axum::{
    extract::{RawQuery, State},
    http::{
        header::{CONTENT_TYPE, ORIGIN},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use gatehouse_auth::ServerClient;
use gatehouse_core::gate::{
    load_layout, run_action, ActionContext, ActionData, FormAction, LoadContext, Outcome,
    ROOT_PATH,
};

use super::{gate::redirect_response, pages::render_landing, AppError};
use crate::state::AppState;

/// Action name from a `?/name` query, ignoring any further parameters.
fn action_name(query: Option<&str>) -> Option<&str> {
    let name = query?.strip_prefix('/')?;
    let name = name.split('&').next().unwrap_or_default();
    (!name.is_empty()).then_some(name)
}

/// Content types a browser can submit from a plain `<form>`.
const FORM_CONTENT_TYPES: [&str; 3] = [
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
];

fn is_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| FORM_CONTENT_TYPES.contains(&mime.as_str()))
}

/// A form post whose `Origin` is missing or not ours.
fn is_cross_site(headers: &HeaderMap, state: &AppState) -> bool {
    if !is_form_content_type(headers) {
        return false;
    }
    let expected = state.auth.config.app_origin.origin().ascii_serialization();
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    origin != Some(expected.as_str())
}

/// Handler for POST /
///
/// Runs the named action. A redirect is returned as-is; otherwise the root
/// page is loaded through the gate and rendered with the action result.
pub async fn root_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    client: ServerClient,
) -> Result<Response, AppError> {
    if is_cross_site(&headers, &state) {
        tracing::warn!(origin = ?headers.get(ORIGIN), "Rejected cross-site form submission");
        let body = "Cross-site POST form submissions are forbidden";
        return Ok((StatusCode::FORBIDDEN, body).into_response());
    }

    let Some(name) = action_name(query.as_deref()) else {
        return Ok((StatusCode::BAD_REQUEST, "Missing form action name").into_response());
    };
    let action = match name.parse::<FormAction>() {
        Ok(action) => action,
        Err(e) => {
            tracing::debug!(action = name, "Unknown form action");
            return Ok((StatusCode::NOT_FOUND, e.to_string()).into_response());
        }
    };
    if !is_form_content_type(&headers) {
        let body = "Form actions expect form-encoded data";
        return Ok((StatusCode::UNSUPPORTED_MEDIA_TYPE, body).into_response());
    }

    tracing::debug!(action = action.name(), "Running form action");
    let outcome = run_action(
        action,
        &ActionContext {
            identity: &client,
            origin: &state.auth.config.app_origin,
        },
    )
    .await;

    let action_data = match outcome {
        Outcome::Redirect(redirect) => {
            return Ok((client.into_jar(), redirect_response(&redirect)).into_response());
        }
        Outcome::Proceed(data) => data,
    };

    render_after_action(client, &action_data).await
}

/// Load the root page through the gate after an action that did not redirect.
async fn render_after_action(
    client: ServerClient,
    action_data: &ActionData,
) -> Result<Response, AppError> {
    let outcome = load_layout(&LoadContext {
        sessions: &client,
        path: ROOT_PATH,
        cookies: &client,
    })
    .await;

    let jar = client.into_jar();
    match outcome {
        Outcome::Redirect(redirect) => Ok((jar, redirect_response(&redirect)).into_response()),
        Outcome::Proceed(layout) => {
            let html = render_landing(&layout, Some(action_data))?;
            Ok((jar, Html(html)).into_response())
        }
    }
}

//! Access gate middleware.
//!
//! Runs the core gate before every page. Redirects become 303 responses;
//! otherwise the layout data is stored in request extensions for the page.

use axum::{
    extract::{Request, State},
    http::{header::LOCATION, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gatehouse_auth::ServerClient;
use gatehouse_core::gate::{load_layout, LoadContext, Outcome, Redirect, ROOT_PATH};

use crate::state::AppState;

/// Turn a core redirect into an HTTP response.
pub fn redirect_response(redirect: &Redirect) -> Response {
    let status = StatusCode::from_u16(redirect.status.code()).unwrap_or(StatusCode::SEE_OTHER);
    (status, [(LOCATION, redirect.location.clone())]).into_response()
}

/// Form actions on `/` run before the gate; the action handler loads the page itself.
fn is_form_action(request: &Request) -> bool {
    request.method() == Method::POST && request.uri().path() == ROOT_PATH
}

pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_form_action(&request) {
        return next.run(request).await;
    }

    let client = ServerClient::new(&state.auth, request.headers());
    let path = request.uri().path().to_string();

    let outcome = load_layout(&LoadContext {
        sessions: &client,
        path: &path,
        cookies: &client,
    })
    .await;

    // Refreshed or cleared session cookies ride along on either branch
    let jar = client.into_jar();
    match outcome {
        Outcome::Redirect(redirect) => (jar, redirect_response(&redirect)).into_response(),
        Outcome::Proceed(layout) => {
            request.extensions_mut().insert(layout);
            (jar, next.run(request).await).into_response()
        }
    }
}

use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use gatehouse_auth::auth_routes;
use gatehouse_core::gate::{DASHBOARD_PATH, ROOT_PATH};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        actions::root_action,
        gate::access_gate,
        health::livez,
        pages::{dashboard, landing, not_found},
    },
    state::AppState,
};

/// Creates the main application router with all routes configured.
pub fn create_app(state: AppState) -> Router {
    // OAuth callback runs outside the gate
    let auth = auth_routes().with_state(state.auth.clone());

    Router::new()
        .route(ROOT_PATH, get(landing).post(root_action))
        .route(DASHBOARD_PATH, get(dashboard))
        .fallback(not_found)
        // Everything above goes through the access gate
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .route("/livez", get(livez))
        .with_state(state)
        .merge(auth)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
}

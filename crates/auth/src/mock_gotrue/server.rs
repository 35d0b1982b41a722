//! Mock GoTrue server for development and testing.
//!
//! Serves the `/auth/v1` endpoints gatehouse calls, backed by [`MockStore`],
//! plus a fake Google consent page in place of the real provider.

use std::net::SocketAddr;

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use gatehouse_core::auth::{OAuthProvider, Session};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

use super::store::MockStore;
use super::templates;

#[derive(Deserialize)]
struct AuthorizeQuery {
    provider: String,
    redirect_to: String,
    code_challenge: String,
}

#[derive(Deserialize)]
struct ConsentForm {
    email: String,
    name: Option<String>,
    redirect_to: String,
    code_challenge: String,
}

#[derive(Deserialize)]
struct TokenQuery {
    grant_type: String,
}

#[derive(Deserialize)]
struct TokenBody {
    auth_code: Option<String>,
    code_verifier: Option<String>,
    refresh_token: Option<String>,
}

/// Mock server that simulates the Supabase auth API.
#[derive(Clone)]
pub struct MockGoTrueServer {
    port: u16,
    store: MockStore,
}

impl MockGoTrueServer {
    /// Create a new mock server.
    ///
    /// # Arguments
    /// * `port` - The port to listen on (`0` picks a free one in [`spawn`](Self::spawn))
    pub fn new(port: u16) -> Self {
        Self {
            port,
            store: MockStore::default(),
        }
    }

    /// Routes:
    /// - `GET /auth/v1/authorize` - Mock Google consent page
    /// - `POST /auth/v1/authorize/submit` - Consent form, redirects with `?code=`
    /// - `POST /auth/v1/token` - `pkce` and `refresh_token` grants
    /// - `GET /auth/v1/user` - User for a bearer token
    /// - `POST /auth/v1/logout` - Revoke the bearer token's sessions
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/logout", post(logout))
            .layer(middleware::from_fn(require_api_key));

        Router::new()
            .route("/auth/v1/authorize", get(authorize))
            .route("/auth/v1/authorize/submit", post(authorize_submit))
            .merge(api)
            .with_state(self.store.clone())
    }

    /// Bind and serve in a background task, returning the bound address.
    pub async fn spawn(&self) -> Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], self.port))).await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock GoTrue server stopped");
            }
        });

        Ok(addr)
    }

    /// Sign `email` in without going through the consent page.
    pub async fn issue_session(&self, email: &str, ttl_secs: i64) -> Session {
        self.store.issue_session(email, ttl_secs).await
    }

    /// Make `POST /auth/v1/logout` answer 500.
    pub async fn set_fail_sign_outs(&self, fail: bool) {
        self.store.set_fail_sign_outs(fail).await;
    }

    /// Whether an access token is still accepted.
    pub async fn is_active(&self, access_token: &str) -> bool {
        self.store.user_for_token(access_token).await.is_some()
    }
}

fn api_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "code": status.as_u16(), "msg": msg }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn require_api_key(request: Request, next: Next) -> Response {
    if !request.headers().contains_key("apikey") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "No API key found in request" })),
        )
            .into_response();
    }
    next.run(request).await
}

async fn authorize(Query(query): Query<AuthorizeQuery>) -> Response {
    if query.provider != OAuthProvider::Google.to_string() {
        return api_error(
            StatusCode::BAD_REQUEST,
            "Unsupported provider: Provider is not enabled",
        );
    }
    Html(templates::login_page(&query.redirect_to, &query.code_challenge)).into_response()
}

async fn authorize_submit(
    State(store): State<MockStore>,
    Form(form): Form<ConsentForm>,
) -> Response {
    let Ok(mut callback) = Url::parse(&form.redirect_to) else {
        return api_error(StatusCode::BAD_REQUEST, "Invalid redirect_to");
    };

    let code = store
        .create_code(&form.email, form.name.as_deref(), &form.code_challenge)
        .await;
    callback.query_pairs_mut().append_pair("code", &code);

    Redirect::to(callback.as_str()).into_response()
}

async fn token(
    State(store): State<MockStore>,
    Query(query): Query<TokenQuery>,
    Json(body): Json<TokenBody>,
) -> Response {
    let session = match query.grant_type.as_str() {
        "pkce" => match (body.auth_code, body.code_verifier) {
            (Some(code), Some(verifier)) => store.redeem_code(&code, &verifier).await,
            _ => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    "invalid request: both auth code and code verifier should be non-empty",
                )
            }
        },
        "refresh_token" => match body.refresh_token {
            Some(refresh_token) => store.refresh(&refresh_token).await,
            None => return api_error(StatusCode::BAD_REQUEST, "Refresh Token Not Found"),
        },
        _ => return api_error(StatusCode::BAD_REQUEST, "unsupported_grant_type"),
    };

    match session {
        Some(session) => Json(session).into_response(),
        None => api_error(StatusCode::BAD_REQUEST, "Invalid Refresh Token or Auth Code"),
    }
}

async fn user(State(store): State<MockStore>, headers: HeaderMap) -> Response {
    let Some(access_token) = bearer(&headers) else {
        return api_error(StatusCode::UNAUTHORIZED, "This endpoint requires a Bearer token");
    };

    match store.user_for_token(access_token).await {
        Some(user) => Json(user).into_response(),
        None => api_error(
            StatusCode::UNAUTHORIZED,
            "invalid JWT: unable to parse or verify signature",
        ),
    }
}

async fn logout(State(store): State<MockStore>, headers: HeaderMap) -> Response {
    let Some(access_token) = bearer(&headers) else {
        return api_error(StatusCode::UNAUTHORIZED, "This endpoint requires a Bearer token");
    };

    if store.fail_sign_outs().await {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }

    if store.revoke(access_token).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        api_error(
            StatusCode::UNAUTHORIZED,
            "invalid JWT: unable to parse or verify signature",
        )
    }
}

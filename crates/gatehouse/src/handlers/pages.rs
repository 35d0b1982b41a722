//! Server-rendered pages.
//!
//! Every page embeds the gate's layout data as JSON in
//! `<script id="layout-data">` for client-side code.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension,
};
use gatehouse_core::gate::{ActionData, FormAction, LayoutData};
use html_escape::encode_text;

use crate::handlers::AppError;

/// Handler for GET /
pub async fn landing(
    Extension(layout): Extension<LayoutData>,
) -> Result<Html<String>, AppError> {
    render_landing(&layout, None).map(Html)
}

/// Handler for GET /dashboard
pub async fn dashboard(
    Extension(layout): Extension<LayoutData>,
) -> Result<Html<String>, AppError> {
    render_dashboard(&layout).map(Html)
}

/// Fallback for unknown paths. Only signed-in visitors get this far.
pub async fn not_found(Extension(layout): Extension<LayoutData>) -> Result<Response, AppError> {
    let body = r#"<h1>Not found</h1>
        <p><a href="/dashboard">Back to your dashboard</a></p>"#;
    let html = render_page("Not found - Gatehouse", body, &layout)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

/// The sign-in page, optionally with the result of a form action that did not redirect.
pub fn render_landing(
    layout: &LayoutData,
    action: Option<&ActionData>,
) -> Result<String, AppError> {
    let error = action
        .and_then(|a| a.error.as_deref())
        .map(|message| {
            format!(
                r#"<p class="error" role="alert">{}</p>"#,
                encode_text(message)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Welcome to Gatehouse</h1>
        <p class="subtitle">Sign in to continue to your dashboard</p>
        {error}
        <form method="POST">
            <button type="submit" formaction="?/{google}">Sign in with Google</button>
        </form>"#,
        google = FormAction::Google.name(),
    );

    render_page("Sign in - Gatehouse", &body, layout)
}

fn render_dashboard(layout: &LayoutData) -> Result<String, AppError> {
    let (name, email) = match &layout.user {
        Some(user) => (
            user.display_name(),
            user.email.clone().unwrap_or_default(),
        ),
        None => ("there".to_string(), String::new()),
    };

    let body = format!(
        r#"<h1>Hello, {name}</h1>
        <p class="subtitle">Signed in as {email}</p>
        <p>{cookie_count} cookies on this request.</p>
        <form method="POST" action="/?/{log_out}">
            <button type="submit">Sign out</button>
        </form>"#,
        name = encode_text(&name),
        email = encode_text(&email),
        cookie_count = layout.cookies.len(),
        log_out = FormAction::LogOut.name(),
    );

    render_page("Dashboard - Gatehouse", &body, layout)
}

/// Wrap a page body in the document shell.
fn render_page(title: &str, body: &str, layout: &LayoutData) -> Result<String, AppError> {
    // `<` can't appear raw inside a script element
    let data = serde_json::to_string(layout)?.replace('<', "\\u003c");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
            background: #f5f5f5;
        }}
        main {{
            background: #fff;
            border-radius: 12px;
            padding: 2.5rem;
            box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
            max-width: 400px;
            width: 100%;
            text-align: center;
        }}
        .subtitle {{
            color: #666;
        }}
        .error {{
            color: #b00020;
        }}
        button {{
            padding: 0.875rem 1.5rem;
            border-radius: 8px;
            border: 1px solid #ddd;
            background: #fff;
            font-size: 1rem;
            cursor: pointer;
        }}
    </style>
</head>
<body>
    <main>
        {body}
    </main>
    <script id="layout-data" type="application/json">{data}</script>
</body>
</html>"#,
        title = encode_text(title),
    ))
}

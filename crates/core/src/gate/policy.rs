use serde::Serialize;

use super::{Outcome, Redirect};
use crate::auth::{CookiePair, CookieSource, SessionAccessor, SessionContext, User};

/// The landing page, which hosts the sign-in form.
pub const ROOT_PATH: &str = "/";

/// Where signed-in visitors to the landing page are sent.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Data the gate hands to every page it lets through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutData {
    pub user: Option<User>,
    pub cookies: Vec<CookiePair>,
}

/// Everything the gate reads for one request.
pub struct LoadContext<'a> {
    pub sessions: &'a dyn SessionAccessor,
    pub path: &'a str,
    /// Read after the session lookup, so refreshed session cookies show up.
    pub cookies: &'a dyn CookieSource,
}

/// Decide whether a visitor may see `path`.
///
/// - signed in, on `/`: 303 to `/dashboard`
/// - signed out, anywhere but `/`: 303 to `/`
/// - anything else passes
pub fn access_redirect(user: Option<&User>, path: &str) -> Option<Redirect> {
    match (user.is_some(), path == ROOT_PATH) {
        (true, true) => Some(Redirect::see_other(DASHBOARD_PATH)),
        (false, false) => Some(Redirect::see_other(ROOT_PATH)),
        _ => None,
    }
}

/// Run the access gate for a page request.
pub async fn load_layout(ctx: &LoadContext<'_>) -> Outcome<LayoutData> {
    let SessionContext { user, .. } = ctx.sessions.safe_get_session().await;

    if let Some(redirect) = access_redirect(user.as_ref(), ctx.path) {
        tracing::debug!(
            path = ctx.path,
            authenticated = user.is_some(),
            location = %redirect.location,
            "Access gate redirect"
        );
        return Outcome::Redirect(redirect);
    }

    Outcome::Proceed(LayoutData {
        user,
        cookies: ctx.cookies.get_all(),
    })
}

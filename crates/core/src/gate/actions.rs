use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::{Outcome, Redirect, ROOT_PATH};
use crate::auth::{AuthError, IdentityClient, OAuthInitiation, OAuthProvider, OAuthSignIn};

/// Path the identity provider redirects back to after OAuth consent.
pub const CALLBACK_PATH: &str = "/auth/callback";

const OAUTH_FAILED_MESSAGE: &str = "Could not start sign-in with Google. Please try again.";

/// Named form actions on the root page (`POST /?/<name>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Google,
    LogOut,
}

impl FormAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::LogOut => "logOut",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no action with name '{0}' found")]
pub struct UnknownAction(pub String);

impl FromStr for FormAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "logOut" => Ok(Self::LogOut),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Data returned by an action that did not redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionData {
    /// Message to show on the re-rendered page.
    pub error: Option<String>,
}

/// Everything an action reads for one request.
pub struct ActionContext<'a> {
    pub identity: &'a dyn IdentityClient,
    /// Origin of the incoming request, e.g. `https://app.example.com`.
    pub origin: &'a Url,
}

/// `<origin>/auth/callback`
pub fn callback_url(origin: &Url) -> Result<Url, AuthError> {
    origin
        .join(CALLBACK_PATH)
        .map_err(|e| AuthError::InvalidRedirect(e.to_string()))
}

/// Dispatch a parsed form action.
pub async fn run_action(action: FormAction, ctx: &ActionContext<'_>) -> Outcome<ActionData> {
    match action {
        FormAction::Google => sign_in_with_google(ctx).await,
        FormAction::LogOut => log_out(ctx).await,
    }
}

/// Start the Google OAuth flow; 302 to the provider when it hands back a URL.
pub async fn sign_in_with_google(ctx: &ActionContext<'_>) -> Outcome<ActionData> {
    let redirect_to = match callback_url(ctx.origin) {
        Ok(url) => url,
        Err(e) => return oauth_failed(e),
    };

    let request = OAuthSignIn {
        provider: OAuthProvider::Google,
        redirect_to,
    };

    match ctx.identity.sign_in_with_oauth(&request).await {
        Ok(OAuthInitiation { url: Some(url), .. }) => {
            Outcome::Redirect(Redirect::found(String::from(url)))
        }
        Ok(OAuthInitiation { url: None, provider }) => {
            tracing::warn!(%provider, "OAuth sign-in returned no URL");
            Outcome::Proceed(ActionData::default())
        }
        Err(e) => oauth_failed(e),
    }
}

fn oauth_failed(error: AuthError) -> Outcome<ActionData> {
    tracing::error!(error = %error, "Error starting OAuth sign-in");
    Outcome::Proceed(ActionData {
        error: Some(OAUTH_FAILED_MESSAGE.to_string()),
    })
}

/// Sign out; 302 home on success, log and carry on otherwise.
pub async fn log_out(ctx: &ActionContext<'_>) -> Outcome<ActionData> {
    match ctx.identity.sign_out().await {
        Ok(()) => Outcome::Redirect(Redirect::found(ROOT_PATH)),
        Err(e) => {
            tracing::error!(error = %e, "Error signing out");
            Outcome::Proceed(ActionData::default())
        }
    }
}

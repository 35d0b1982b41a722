use chrono::{DateTime, Utc};

use super::{AuthError, Session};

/// Check if a session's access token expires within `margin_secs` of `now`.
///
/// Sessions without an expiry timestamp are treated as fresh.
pub fn is_session_expiring(session: &Session, now: DateTime<Utc>, margin_secs: i64) -> bool {
    match session.expires_at {
        Some(expires_at) => expires_at <= now.timestamp() + margin_secs,
        None => false,
    }
}

/// Fill in `expires_at` from `expires_in` when the auth server left it out.
pub fn stamp_expiry(mut session: Session, received_at: DateTime<Utc>) -> Session {
    if session.expires_at.is_none() {
        session.expires_at = Some(received_at.timestamp() + session.expires_in);
    }
    session
}

/// Sign-out errors that mean the session is already gone server-side.
pub fn is_ignorable_sign_out_error(error: &AuthError) -> bool {
    matches!(error.status(), Some(401 | 403 | 404))
}

/// Extract username from email if no name provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}

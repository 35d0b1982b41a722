//! Session cookie codec.
//!
//! Sessions are stored the way `@supabase/ssr` stores them: the JSON session,
//! base64url-encoded behind a `base64-` prefix, split across `<name>.0`,
//! `<name>.1`, ... when it does not fit in one cookie.

use axum::http::{header::COOKIE, HeaderMap};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use gatehouse_core::auth::{AuthError, CookiePair, Result, Session};

/// Largest value written to a single cookie.
pub const MAX_CHUNK_SIZE: usize = 3180;

const BASE64_PREFIX: &str = "base64-";

/// Browsers cap cookie lifetime at 400 days.
const SESSION_MAX_AGE: time::Duration = time::Duration::days(400);

const VERIFIER_MAX_AGE: time::Duration = time::Duration::minutes(10);

pub fn encode_session(session: &Session) -> Result<String> {
    let json = serde_json::to_vec(session).map_err(|e| AuthError::InvalidCookie(e.to_string()))?;
    Ok(format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
}

/// Decode a session cookie value. Plain JSON values are accepted too.
pub fn decode_session(value: &str) -> Result<Session> {
    let json = match value.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidCookie(e.to_string()))?,
        None => value.as_bytes().to_vec(),
    };
    serde_json::from_slice(&json).map_err(|e| AuthError::InvalidCookie(e.to_string()))
}

/// Split a value into cookie-sized pieces on char boundaries.
pub fn split_chunks(value: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while rest.len() > MAX_CHUNK_SIZE {
        let mut at = MAX_CHUNK_SIZE;
        while !rest.is_char_boundary(at) {
            at -= 1;
        }
        let (head, tail) = rest.split_at(at);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}

fn chunk_name(name: &str, index: usize) -> String {
    format!("{name}.{index}")
}

/// Names of `<name>.N` chunk cookies present in the jar.
fn chunk_names(jar: &CookieJar, name: &str) -> Vec<String> {
    let prefix = format!("{name}.");
    jar.iter()
        .filter(|cookie| {
            cookie
                .name()
                .strip_prefix(&prefix)
                .is_some_and(|index| index.parse::<usize>().is_ok())
        })
        .map(|cookie| cookie.name().to_string())
        .collect()
}

/// Read a possibly chunked value: the plain cookie wins, else chunks in order.
pub fn read_chunked(jar: &CookieJar, name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(name) {
        return Some(cookie.value().to_string());
    }

    let mut value = String::new();
    for index in 0.. {
        match jar.get(&chunk_name(name, index)) {
            Some(cookie) => value.push_str(cookie.value()),
            None => break,
        }
    }
    (!value.is_empty()).then_some(value)
}

/// Write a value under `name`, chunking if needed and dropping stale pieces.
pub fn write_chunked(jar: CookieJar, name: &str, value: &str, secure: bool) -> CookieJar {
    let chunks = split_chunks(value);
    let stale = chunk_names(&jar, name);

    if let [single] = chunks.as_slice() {
        let jar = stale
            .into_iter()
            .fold(jar, |jar, stale| jar.remove(removal_cookie(stale)));
        return jar.add(session_cookie(name.to_string(), single.to_string(), secure));
    }

    let mut jar = jar;
    if jar.get(name).is_some() {
        jar = jar.remove(removal_cookie(name.to_string()));
    }
    for stale in stale {
        let index = stale.rsplit('.').next().and_then(|i| i.parse::<usize>().ok());
        if index.is_some_and(|i| i >= chunks.len()) {
            jar = jar.remove(removal_cookie(stale));
        }
    }
    for (index, chunk) in chunks.iter().enumerate() {
        jar = jar.add(session_cookie(chunk_name(name, index), chunk.to_string(), secure));
    }
    jar
}

/// Remove a value and all of its chunks.
pub fn remove_chunked(jar: CookieJar, name: &str) -> CookieJar {
    let mut jar = jar;
    if jar.get(name).is_some() {
        jar = jar.remove(removal_cookie(name.to_string()));
    }
    chunk_names(&jar, name)
        .into_iter()
        .fold(jar, |jar, chunk| jar.remove(removal_cookie(chunk)))
}

/// Cookies from the `Cookie` header in request order.
///
/// When a name repeats, the first value wins.
pub fn request_cookies(headers: &HeaderMap) -> Vec<CookiePair> {
    let mut pairs: Vec<CookiePair> = Vec::new();
    let cookies = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse_encoded(value))
        .filter_map(|cookie| cookie.ok());

    for cookie in cookies {
        if !pairs.iter().any(|pair| pair.name == cookie.name()) {
            pairs.push(CookiePair::new(cookie.name(), cookie.value()));
        }
    }
    pairs
}

pub fn session_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(SESSION_MAX_AGE)
        .build()
}

pub fn verifier_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(VERIFIER_MAX_AGE)
        .build()
}

/// Removal must match the path the cookie was set with.
pub fn removal_cookie(name: String) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::auth::User;
    use uuid::Uuid;

    const NAME: &str = "sb-proj-auth-token";

    fn session_with_metadata(padding: usize) -> Session {
        Session {
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(1_900_000_000),
            user: User {
                id: Uuid::new_v4(),
                aud: "authenticated".to_string(),
                role: Some("authenticated".to_string()),
                email: Some("ada@example.com".to_string()),
                app_metadata: serde_json::json!({ "provider": "google" }),
                user_metadata: serde_json::json!({ "bio": "x".repeat(padding) }),
                created_at: None,
            },
        }
    }

    #[test]
    fn session_survives_encoding() {
        let session = session_with_metadata(10);
        let encoded = encode_session(&session).unwrap();

        assert!(encoded.starts_with("base64-"));
        assert_eq!(decode_session(&encoded).unwrap(), session);
    }

    #[test]
    fn decode_accepts_plain_json() {
        let session = session_with_metadata(0);
        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(decode_session(&json).unwrap(), session);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_session("base64-!!!not-base64!!!"),
            Err(AuthError::InvalidCookie(_))
        ));
        assert!(matches!(
            decode_session("not json"),
            Err(AuthError::InvalidCookie(_))
        ));
    }

    #[test]
    fn split_chunks_respects_limit() {
        let value = "a".repeat(MAX_CHUNK_SIZE * 2 + 5);
        let chunks = split_chunks(&value);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_SIZE));
        assert_eq!(chunks.concat(), value);
    }

    #[test]
    fn split_chunks_never_splits_a_char() {
        let value = "é".repeat(MAX_CHUNK_SIZE);
        let chunks = split_chunks(&value);
        assert_eq!(chunks.concat(), value);
    }

    #[test]
    fn small_value_is_one_cookie() {
        let jar = write_chunked(CookieJar::new(), NAME, "base64-small", true);

        assert_eq!(jar.get(NAME).unwrap().value(), "base64-small");
        assert!(jar.get(&format!("{NAME}.0")).is_none());
        assert_eq!(read_chunked(&jar, NAME).as_deref(), Some("base64-small"));
    }

    #[test]
    fn large_session_round_trips_through_chunks() {
        let session = session_with_metadata(MAX_CHUNK_SIZE * 2);
        let encoded = encode_session(&session).unwrap();

        let jar = write_chunked(CookieJar::new(), NAME, &encoded, true);

        assert!(jar.get(NAME).is_none());
        assert!(jar.get(&format!("{NAME}.0")).is_some());
        assert!(jar.get(&format!("{NAME}.1")).is_some());

        let read = read_chunked(&jar, NAME).unwrap();
        assert_eq!(decode_session(&read).unwrap(), session);
    }

    #[test]
    fn shrinking_value_drops_stale_chunks() {
        let big = "b".repeat(MAX_CHUNK_SIZE + 10);
        let jar = write_chunked(CookieJar::new(), NAME, &big, true);
        let jar = write_chunked(jar, NAME, "small", true);

        assert!(jar.get(&format!("{NAME}.0")).is_none());
        assert!(jar.get(&format!("{NAME}.1")).is_none());
        assert_eq!(read_chunked(&jar, NAME).as_deref(), Some("small"));
    }

    #[test]
    fn remove_chunked_clears_everything() {
        let big = "c".repeat(MAX_CHUNK_SIZE * 3);
        let jar = write_chunked(CookieJar::new(), NAME, &big, true);
        let jar = remove_chunked(jar, NAME);

        assert_eq!(read_chunked(&jar, NAME), None);
    }

    #[test]
    fn missing_value_reads_none() {
        assert_eq!(read_chunked(&CookieJar::new(), NAME), None);
    }

    #[test]
    fn request_cookies_keep_header_order_and_first_duplicate() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "a=1; b=2; c=3; d=4; e=5; f=6; a=7".parse().unwrap());

        let names: Vec<(String, String)> = request_cookies(&headers)
            .into_iter()
            .map(|pair| (pair.name, pair.value))
            .collect();

        assert_eq!(
            names,
            [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5"), ("f", "6")]
                .map(|(n, v)| (n.to_string(), v.to_string()))
        );
    }

    #[test]
    fn request_cookies_span_header_lines() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, "theme=dark".parse().unwrap());
        headers.append(COOKIE, "lang=en; theme=light".parse().unwrap());

        assert_eq!(
            request_cookies(&headers),
            vec![CookiePair::new("theme", "dark"), CookiePair::new("lang", "en")]
        );
    }
}

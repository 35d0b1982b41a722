use url::Url;

use crate::error::AuthError;

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the Supabase project (GoTrue lives under `/auth/v1`).
    pub supabase_url: Url,
    /// Public anon key sent as the `apikey` header.
    pub anon_key: String,
    /// Public origin of this app, used to build the OAuth callback URL.
    pub app_origin: Url,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn new(supabase_url: Url, anon_key: impl Into<String>, app_origin: Url) -> Self {
        let cookie_name = session_cookie_name(&supabase_url);
        Self {
            supabase_url,
            anon_key: anon_key.into(),
            app_origin,
            cookie_name,
            cookie_secure: true,
        }
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Cookie holding the PKCE verifier between sign-in and callback.
    pub fn verifier_cookie_name(&self) -> String {
        format!("{}-code-verifier", self.cookie_name)
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SUPABASE_URL`: Supabase project URL (required)
    /// - `SUPABASE_ANON_KEY`: Supabase anon key (required)
    /// - `APP_ORIGIN`: Public origin of this app (default: `http://localhost:3000`)
    /// - `COOKIE_SECURE`: Whether to set secure flag on cookies (default: true)
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if a required variable is missing or a URL is invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| AuthError::Config(format!("{key} must be set")))
        };
        let parse_url = |key: &str, value: String| {
            Url::parse(&value).map_err(|e| AuthError::Config(format!("{key} is not a valid URL: {e}")))
        };

        let supabase_url = parse_url("SUPABASE_URL", required("SUPABASE_URL")?)?;
        let anon_key = required("SUPABASE_ANON_KEY")?;
        let app_origin = parse_url(
            "APP_ORIGIN",
            lookup("APP_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
        )?;

        let cookie_secure = lookup("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Ok(Self::new(supabase_url, anon_key, app_origin).with_cookie_secure(cookie_secure))
    }
}

/// `sb-<project-ref>-auth-token`, where the ref is the first label of the host.
fn session_cookie_name(supabase_url: &Url) -> String {
    let project_ref = supabase_url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("local");
    format!("sb-{project_ref}-auth-token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn cookie_name_uses_project_ref() {
        let config = AuthConfig::new(
            Url::parse("https://abcdefgh.supabase.co").unwrap(),
            "anon",
            Url::parse("http://localhost:3000").unwrap(),
        );
        assert_eq!(config.cookie_name, "sb-abcdefgh-auth-token");
        assert_eq!(
            config.verifier_cookie_name(),
            "sb-abcdefgh-auth-token-code-verifier"
        );
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "http://127.0.0.1:54321"),
            ("SUPABASE_ANON_KEY", "anon-key"),
        ]))
        .unwrap();

        assert_eq!(config.anon_key, "anon-key");
        assert_eq!(config.app_origin.as_str(), "http://localhost:3000/");
        assert!(config.cookie_secure);
        assert_eq!(config.cookie_name, "sb-127-auth-token");
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon-key"),
            ("APP_ORIGIN", "https://app.example.com"),
            ("COOKIE_SECURE", "0"),
        ]))
        .unwrap();

        assert_eq!(config.app_origin.as_str(), "https://app.example.com/");
        assert!(!config.cookie_secure);
    }

    #[test]
    fn from_lookup_requires_supabase_url() {
        let result = AuthConfig::from_lookup(lookup_from(&[("SUPABASE_ANON_KEY", "anon")]));
        assert!(matches!(result, Err(AuthError::Config(msg)) if msg.contains("SUPABASE_URL")));
    }

    #[test]
    fn from_lookup_rejects_invalid_url() {
        let result = AuthConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "not a url"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}

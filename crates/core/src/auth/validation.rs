/// Checks the `next` path sent to the OAuth callback.
///
/// Only same-site absolute paths pass. Browsers treat `//host` and `/\host`
/// as links to another host, so both are refused, as are control characters
/// and anything carrying a scheme.
///
/// ```
/// use gatehouse_core::auth::validate_return_to;
///
/// assert_eq!(validate_return_to("/dashboard"), Some("/dashboard"));
/// assert_eq!(validate_return_to("/\\evil.com"), None);
/// ```
pub fn validate_return_to(next: &str) -> Option<&str> {
    let rest = next.strip_prefix('/')?;

    let leaves_site = rest.starts_with(['/', '\\'])
        || next.contains("://")
        || next.chars().any(char::is_control);

    (!leaves_site).then_some(next)
}

//! Session cookie encoding.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

/// Extract the session id from `Cookie` headers.
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// `Set-Cookie` value carrying `session_id`.
pub fn set_cookie(cookie_name: &str, session_id: Uuid, max_age_secs: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{cookie_name}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .ok()
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_cookie(cookie_name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&format!("theme=dark; session={id}; x=1")).unwrap());
        assert_eq!(session_id(&headers, "session"), Some(id));
        assert_eq!(session_id(&headers, "other"), None);
    }

    #[test]
    fn test_malformed_session_id() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=garbage"));
        assert_eq!(session_id(&headers, "session"), None);
    }

    #[test]
    fn test_set_and_clear() {
        let id = Uuid::new_v4();
        let set = set_cookie("session", id, 60).unwrap();
        assert!(set.to_str().unwrap().starts_with(&format!("session={id};")));
        assert!(clear_cookie("session").unwrap().to_str().unwrap().contains("Max-Age=0"));
    }
}

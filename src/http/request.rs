//! Inbound request conversion.
//!
//! # Responsibilities
//! - Read the request id set by `SetRequestIdLayer`
//! - Turn axum request parts plus the buffered body into a routing `Request`
//! - Build the request scope (cookie session id, body) for the environment
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - The body is buffered with a hard size limit before routing

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::interpreter::RequestScope;
use crate::routing::Request;
use crate::session::cookie;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request id, or "unknown" if the layer did not run.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Routing view of an inbound request.
pub fn routing_request(parts: &Parts, body: Bytes) -> Request {
    Request::from_parts(parts.method.clone(), parts.uri.path(), parts.uri.query(), Some(body))
}

/// Environment inputs for an inbound request.
pub fn scope(parts: &Parts, request: &Request, cookie_name: &str) -> RequestScope {
    RequestScope {
        request_id: request_id(&parts.headers),
        session_id: cookie::session_id(&parts.headers, cookie_name),
        body: request.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::Method;
    use uuid::Uuid;

    fn parts(method: Method, uri: &str, headers: &[(&str, String)]) -> Parts {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_routing_request() {
        let parts = parts(Method::GET, "/episodes/42?t=90", &[]);
        let request = routing_request(&parts, Bytes::new());
        assert_eq!(request.path, vec!["episodes".to_string(), "42".to_string()]);
        assert_eq!(request.query.get("t").map(String::as_str), Some("90"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_scope() {
        let session = Uuid::new_v4();
        let parts = parts(
            Method::POST,
            "/account",
            &[(X_REQUEST_ID, "req-1".into()), (COOKIE.as_str(), format!("session={session}"))],
        );
        let request = routing_request(&parts, Bytes::from_static(b"name=Ada"));
        let scope = scope(&parts, &request, "session");
        assert_eq!(scope.request_id, "req-1");
        assert_eq!(scope.session_id, Some(session));
        assert_eq!(scope.body.as_deref(), Some(&b"name=Ada"[..]));
    }

    #[test]
    fn test_missing_request_id() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}

//! The axum-backed interpreter.
//!
//! # Responsibilities
//! - Turn terminal operations into `axum::response::Response`
//! - Serve files from disk with a `Cache-Control` hint
//!
//! # Design Decisions
//! - Files are read whole; assets are small
//! - A missing file is a 404, any other read failure a 500

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::db::Database;
use crate::interpreter::{Environment, Interpreter};

pub struct AxumInterpreter<D: Database> {
    environment: Arc<Environment<D>>,
}

impl<D: Database> Clone for AxumInterpreter<D> {
    fn clone(&self) -> Self {
        Self {
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<D: Database> AxumInterpreter<D> {
    pub fn new(environment: Environment<D>) -> Self {
        Self {
            environment: Arc::new(environment),
        }
    }
}

impl<D: Database> Interpreter for AxumInterpreter<D> {
    type Response = Response;
    type Database = D;

    fn environment(&self) -> &Environment<D> {
        &self.environment
    }

    fn respond(&self, body: Bytes, status: StatusCode, headers: HeaderMap) -> Response {
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn serve_file(&self, path: PathBuf, max_age: Duration) -> BoxFuture<'static, Response> {
        let request_id = self.environment.request_id().to_string();
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(contents) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
                    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age.as_secs())) {
                        headers.insert(CACHE_CONTROL, value);
                    }
                    let mut response = Response::new(Body::from(contents));
                    *response.headers_mut() = headers;
                    response
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(request_id = %request_id, path = %path.display(), "File not found");
                    (StatusCode::NOT_FOUND, "Not found").into_response()
                }
                Err(e) => {
                    tracing::error!(request_id = %request_id, path = %path.display(), error = %e, "File read failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
                }
            }
        })
    }

    fn redirect(&self, location: String, headers: HeaderMap) -> Response {
        match HeaderValue::from_str(&location) {
            Ok(value) => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::SEE_OTHER;
                *response.headers_mut() = headers;
                response.headers_mut().insert(LOCATION, value);
                response
            }
            Err(_) => {
                tracing::error!(location = %location, "Redirect target is not a valid header value");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppContext;
    use crate::config::ServerConfig;
    use crate::db::MemoryDatabase;
    use crate::external::StaticIdentityProvider;
    use crate::interpreter::RequestScope;

    fn interpreter() -> AxumInterpreter<MemoryDatabase> {
        let app = Arc::new(AppContext::new(
            MemoryDatabase::new(),
            Arc::new(StaticIdentityProvider::new()),
            &ServerConfig::default(),
        ));
        AxumInterpreter::new(Environment::new(app, RequestScope::default()))
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.css");
        std::fs::write(&path, "body {}").unwrap();

        let response = interpreter().serve_file(path, Duration::from_secs(60)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=60");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/css");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"body {}");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = interpreter()
            .serve_file(dir.path().join("missing.css"), Duration::from_secs(60))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_redirect() {
        let response = interpreter().redirect("/account".into(), HeaderMap::new());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/account");
    }
}

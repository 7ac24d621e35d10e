//! In-process interpreter backend.
//!
//! Terminal operations become `Outcome` values instead of HTTP responses,
//! so handler chains can be run and inspected without a server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{HeaderName, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use futures_util::future::BoxFuture;

use crate::db::Database;
use crate::interpreter::capability::Interpreter;
use crate::interpreter::environment::Environment;

/// What a handler chain ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    File {
        path: PathBuf,
        max_age: Duration,
    },
    Redirect {
        location: String,
        headers: HeaderMap,
    },
}

impl Outcome {
    /// The status a network backend would send.
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Respond { status, .. } => *status,
            Outcome::File { .. } => StatusCode::OK,
            Outcome::Redirect { .. } => StatusCode::SEE_OTHER,
        }
    }

    pub fn body_text(&self) -> &str {
        match self {
            Outcome::Respond { body, .. } => std::str::from_utf8(body).unwrap_or_default(),
            _ => "",
        }
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        let headers = match self {
            Outcome::Respond { headers, .. } | Outcome::Redirect { headers, .. } => headers,
            Outcome::File { .. } => return None,
        };
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.header(&SET_COOKIE)
    }
}

/// Runs handlers against an environment and records the terminal operation.
pub struct TestInterpreter<D: Database> {
    environment: Arc<Environment<D>>,
}

impl<D: Database> Clone for TestInterpreter<D> {
    fn clone(&self) -> Self {
        Self {
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<D: Database> TestInterpreter<D> {
    pub fn new(environment: Environment<D>) -> Self {
        Self {
            environment: Arc::new(environment),
        }
    }
}

impl<D: Database> Interpreter for TestInterpreter<D> {
    type Response = Outcome;
    type Database = D;

    fn environment(&self) -> &Environment<D> {
        &self.environment
    }

    fn respond(&self, body: Bytes, status: StatusCode, headers: HeaderMap) -> Outcome {
        Outcome::Respond { status, headers, body }
    }

    fn serve_file(&self, path: PathBuf, max_age: Duration) -> BoxFuture<'static, Outcome> {
        Box::pin(std::future::ready(Outcome::File { path, max_age }))
    }

    fn redirect(&self, location: String, headers: HeaderMap) -> Outcome {
        Outcome::Redirect { location, headers }
    }
}

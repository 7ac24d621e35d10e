//! Deferred handler values.
//!
//! A `Handler<I>` is what route code returns: a description of the work,
//! not yet bound to any request. Running it against an interpreter is what
//! looks up the session, opens the database and emits the response.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::db::{DbError, Query};
use crate::interpreter::capability::Interpreter;
use crate::interpreter::derived::{CsrfCapability, DatabaseCapability, SessionCapability};
use crate::interpreter::promise::Promise;
use crate::session::{PostedForm, Session};

/// A handler waiting for its interpreter.
pub struct Handler<I: Interpreter> {
    run: Box<dyn FnOnce(I) -> BoxFuture<'static, I::Response> + Send>,
}

impl<I: Interpreter> Handler<I> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(I) -> Fut + Send + 'static,
        Fut: Future<Output = I::Response> + Send + 'static,
    {
        Self {
            run: Box::new(move |interpreter| Box::pin(f(interpreter))),
        }
    }

    /// Bind to `interpreter` and start.
    pub fn run(self, interpreter: I) -> BoxFuture<'static, I::Response> {
        (self.run)(interpreter)
    }
}

impl<I: Interpreter> std::fmt::Debug for Handler<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}

pub fn respond<I: Interpreter>(body: impl Into<Bytes>, status: StatusCode, headers: HeaderMap) -> Handler<I> {
    let body = body.into();
    Handler::new(move |i: I| std::future::ready(i.respond(body, status, headers)))
}

/// Plain text response.
pub fn text<I: Interpreter>(status: StatusCode, body: impl Into<String>) -> Handler<I> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    respond(body.into(), status, headers)
}

/// JSON response. Serialization failure is a 500.
pub fn json<I: Interpreter, T: Serialize>(status: StatusCode, value: &T) -> Handler<I> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            respond(body, status, headers)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
        }
    }
}

pub fn serve_file<I: Interpreter>(path: impl Into<PathBuf>, max_age: Duration) -> Handler<I> {
    let path = path.into();
    Handler::new(move |i: I| i.serve_file(path, max_age))
}

pub fn redirect<I: Interpreter>(location: impl Into<String>) -> Handler<I> {
    redirect_with(location, HeaderMap::new())
}

pub fn redirect_with<I: Interpreter>(location: impl Into<String>, headers: HeaderMap) -> Handler<I> {
    let location = location.into();
    Handler::new(move |i: I| std::future::ready(i.redirect(location, headers)))
}

pub fn on_complete<I, A, F>(promise: Promise<A>, k: F) -> Handler<I>
where
    I: Interpreter,
    A: Clone + Send + 'static,
    F: FnOnce(A) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.on_complete(promise, k))
}

pub fn with_posted_body<I, F, G>(k: F, or_else: G) -> Handler<I>
where
    I: Interpreter,
    F: FnOnce(Bytes) -> Handler<I> + Send + 'static,
    G: FnOnce() -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.with_posted_body(k, or_else))
}

pub fn with_session<I, F>(k: F) -> Handler<I>
where
    I: Interpreter,
    F: FnOnce(Option<Session>) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.with_session(k))
}

pub fn require_session<I, F>(k: F) -> Handler<I>
where
    I: Interpreter,
    F: FnOnce(Session) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.require_session(k))
}

pub fn execute<I, A, F>(query: Query<A>, k: F) -> Handler<I>
where
    I: Interpreter,
    A: Send + 'static,
    F: FnOnce(Result<A, DbError>) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.execute(query, k))
}

pub fn verified_post<I, F>(k: F) -> Handler<I>
where
    I: Interpreter,
    F: FnOnce(Session, PostedForm) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| i.verified_post(k))
}

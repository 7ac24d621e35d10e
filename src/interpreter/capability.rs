//! The primitive capability surface every backend implements.
//!
//! # Responsibilities
//! - Terminal operations: `respond`, `serve_file`, `redirect`
//! - Sequencing: `on_complete` suspends on a `Promise`
//! - Branching on the posted body
//!
//! # Design Decisions
//! - A backend only supplies the terminal operations and its environment;
//!   sequencing and everything in `derived.rs` is shared code
//! - Each request runs exactly one terminal operation: every handler chain
//!   ends in a value of `Self::Response`

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use futures_util::future::BoxFuture;

use crate::db::Database;
use crate::interpreter::environment::Environment;
use crate::interpreter::handler::Handler;
use crate::interpreter::promise::Promise;

/// A backend that can run handlers.
pub trait Interpreter: Clone + Send + Sync + 'static {
    /// What a terminal operation produces.
    type Response: Send + 'static;

    /// Database the request environment draws its handle from.
    type Database: Database;

    /// The request-scoped environment.
    fn environment(&self) -> &Environment<Self::Database>;

    fn respond(&self, body: Bytes, status: StatusCode, headers: HeaderMap) -> Self::Response;

    /// Serve a file with a `max-age` cache hint.
    fn serve_file(&self, path: PathBuf, max_age: Duration) -> BoxFuture<'static, Self::Response>;

    fn redirect(&self, location: String, headers: HeaderMap) -> Self::Response;

    /// Wait for `promise`, then continue with the handler `k` builds from it.
    fn on_complete<A, F>(&self, promise: Promise<A>, k: F) -> BoxFuture<'static, Self::Response>
    where
        A: Clone + Send + 'static,
        F: FnOnce(A) -> Handler<Self> + Send + 'static,
    {
        let interpreter = self.clone();
        Box::pin(async move {
            let value = promise.await;
            k(value).run(interpreter).await
        })
    }

    /// Continue with `k` if the request carried a body, else with `or_else`.
    fn with_posted_body<F, G>(&self, k: F, or_else: G) -> BoxFuture<'static, Self::Response>
    where
        F: FnOnce(Bytes) -> Handler<Self> + Send + 'static,
        G: FnOnce() -> Handler<Self> + Send + 'static,
    {
        match self.environment().body().cloned() {
            Some(body) => k(body).run(self.clone()),
            None => or_else().run(self.clone()),
        }
    }
}

//! Capabilities derived from the primitives.
//!
//! Each trait is implemented once, for every `Interpreter`, so backends
//! never re-implement session, database or CSRF handling.

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::db::{DbError, Query};
use crate::interpreter::capability::Interpreter;
use crate::interpreter::handler::{self, Handler};
use crate::session::{PostedForm, Session};

/// Body sent when a page needs a logged-in user.
pub const LOGIN_REQUIRED: &str = "Please log in to see this page.";

/// Body sent for rejected or malformed posts.
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again.";

pub trait SessionCapability: Interpreter {
    /// Continue with the request's session, if there is one.
    fn with_session<F>(&self, k: F) -> BoxFuture<'static, Self::Response>
    where
        F: FnOnce(Option<Session>) -> Handler<Self> + Send + 'static,
    {
        let session = self.environment().session().cloned();
        k(session).run(self.clone())
    }

    /// Continue with the session, or answer 401.
    fn require_session<F>(&self, k: F) -> BoxFuture<'static, Self::Response>
    where
        F: FnOnce(Session) -> Handler<Self> + Send + 'static,
    {
        let request_id = self.environment().request_id().to_string();
        self.with_session(move |session| match session {
            Some(session) => k(session),
            None => {
                tracing::info!(request_id = %request_id, "Session required but absent");
                handler::text(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED)
            }
        })
    }
}

impl<I: Interpreter> SessionCapability for I {}

pub trait DatabaseCapability: Interpreter {
    /// Run `query` on the request's connection, opening it if needed.
    fn execute<A, F>(&self, query: Query<A>, k: F) -> BoxFuture<'static, Self::Response>
    where
        A: Send + 'static,
        F: FnOnce(Result<A, DbError>) -> Handler<Self> + Send + 'static,
    {
        let interpreter = self.clone();
        Box::pin(async move {
            let result = interpreter.environment().db().run(&query).await;
            k(result).run(interpreter).await
        })
    }
}

impl<I: Interpreter> DatabaseCapability for I {}

pub trait CsrfCapability: SessionCapability {
    /// Continue with the session and form if the form's CSRF token matches
    /// the session's. A missing session is a 401, a mismatch a 403, and a
    /// missing body a 400.
    fn verified_post<F>(&self, k: F) -> BoxFuture<'static, Self::Response>
    where
        F: FnOnce(Session, PostedForm) -> Handler<Self> + Send + 'static,
    {
        self.require_session(move |session| {
            handler::with_posted_body(
                move |body| {
                    let form = PostedForm::parse(&body);
                    if form.has_token(&session.csrf_token) {
                        k(session, form)
                    } else {
                        tracing::warn!(session_id = %session.id, "CSRF token mismatch");
                        handler::text(StatusCode::FORBIDDEN, SOMETHING_WENT_WRONG)
                    }
                },
                || handler::text(StatusCode::BAD_REQUEST, SOMETHING_WENT_WRONG),
            )
        })
    }
}

impl<I: Interpreter> CsrfCapability for I {}

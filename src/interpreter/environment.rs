//! Request-scoped environment.
//!
//! Built once per request from the shared `AppContext` and the parts of the
//! inbound request the handlers may need. Nothing in it is touched until a
//! handler asks: the session is looked up on first use and the database
//! connection opens on the first statement.

use std::sync::{Arc, OnceLock};

use axum::body::Bytes;
use uuid::Uuid;

use crate::app::AppContext;
use crate::db::{Database, DbHandle};
use crate::session::Session;

/// The request-specific inputs of an environment.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    pub request_id: String,
    /// Session id read from the cookie, not yet checked against the store.
    pub session_id: Option<Uuid>,
    pub body: Option<Bytes>,
}

pub struct Environment<D: Database> {
    app: Arc<AppContext<D>>,
    request_id: String,
    session_id: Option<Uuid>,
    session: OnceLock<Option<Session>>,
    body: Option<Bytes>,
    db: DbHandle<D>,
}

impl<D: Database> Environment<D> {
    pub fn new(app: Arc<AppContext<D>>, scope: RequestScope) -> Self {
        let db = DbHandle::new(app.database.clone());
        Self {
            app,
            request_id: scope.request_id,
            session_id: scope.session_id,
            session: OnceLock::new(),
            body: scope.body,
            db,
        }
    }

    pub fn app(&self) -> &AppContext<D> {
        &self.app
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The live session named by the request cookie.
    pub fn session(&self) -> Option<&Session> {
        self.session
            .get_or_init(|| self.session_id.and_then(|id| self.app.sessions.get(&id)))
            .as_ref()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.session().map(|s| s.csrf_token.as_str())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn db(&self) -> &DbHandle<D> {
        &self.db
    }

    /// End of request: release the database connection if one was opened.
    pub async fn finish(&self) -> bool {
        let released = self.db.release().await;
        if released {
            tracing::debug!(request_id = %self.request_id, "Request connection released");
        }
        released
    }
}

impl<D: Database> std::fmt::Debug for Environment<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("request_id", &self.request_id)
            .field("session_id", &self.session_id)
            .field("body", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}

//! Session storage.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::csrf::generate_token;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Token every state-changing POST must echo back.
    pub csrf_token: String,
    /// Creation timestamp (seconds since epoch).
    pub created_at: u64,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            csrf_token: generate_token(),
            created_at: now_secs(),
        }
    }

    /// Check if the session outlived `ttl_secs`.
    pub fn is_expired(&self, ttl_secs: u64) -> bool {
        self.created_at.saturating_add(ttl_secs) <= now_secs()
    }
}

/// A thread-safe session table shared by all requests.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, Session>>,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl_secs,
        }
    }

    /// Start a session for `user_id`.
    pub fn start(&self, user_id: Uuid) -> Session {
        let session = Session::new(user_id);
        self.inner.insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, user_id = %user_id, "Session started");
        session
    }

    /// Store an existing session (used when restoring or in tests).
    pub fn insert(&self, session: Session) {
        self.inner.insert(session.id, session);
    }

    /// Get a live session; expired ones are removed.
    pub fn get(&self, id: &Uuid) -> Option<Session> {
        let session = self.inner.get(id).map(|r| r.value().clone())?;
        if session.is_expired(self.ttl_secs) {
            self.inner.remove(id);
            tracing::debug!(session_id = %id, "Session expired");
            return None;
        }
        Some(session)
    }

    /// End a session. Returns true if it existed.
    pub fn end(&self, id: &Uuid) -> bool {
        self.inner.remove(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

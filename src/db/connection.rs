//! Database backends and the request-scoped handle.
//!
//! # Responsibilities
//! - Define what a backend must provide (connect, run a statement)
//! - Acquire a connection lazily, at most once per request
//! - Release it exactly once, on whichever path the request ends
//!
//! # Design Decisions
//! - Connections release on drop (RAII), so `release()` and `Drop` share one
//!   `Option::take`
//! - No pool is held across requests; each request owns its connection
//! - Statements on one handle run one at a time

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::db::error::DbError;
use crate::db::query::{Query, RawRows};
use crate::db::value::SqlValue;
use crate::observability::metrics;

/// A live connection. Dropping it releases it.
pub trait Connection: Send + 'static {
    /// Run one statement. Failures carry the statement text.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> impl Future<Output = Result<RawRows, DbError>> + Send;
}

/// A source of connections.
pub trait Database: Clone + Send + Sync + 'static {
    type Connection: Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, DbError>> + Send;
}

/// Lazily acquired, request-scoped database access.
pub struct DbHandle<D: Database> {
    database: D,
    connection: Mutex<Option<D::Connection>>,
    released: AtomicBool,
}

impl<D: Database> DbHandle<D> {
    pub fn new(database: D) -> Self {
        Self {
            database,
            connection: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// Run `query`, connecting first if this is the request's first statement.
    pub async fn run<A: 'static>(&self, query: &Query<A>) -> Result<A, DbError> {
        if self.released.load(Ordering::Acquire) {
            return Err(DbError::Released);
        }

        let mut slot = self.connection.lock().await;
        // `release` may have run while this call waited for the lock.
        if self.released.load(Ordering::Acquire) {
            return Err(DbError::Released);
        }
        if slot.is_none() {
            let connection = self.database.connect().await?;
            tracing::debug!("Database connection acquired");
            *slot = Some(connection);
        }
        let connection = slot.as_mut().ok_or(DbError::Released)?;

        tracing::debug!(sql = %query.sql(), params = query.params().len(), "Executing query");
        let raw = match connection.query(query.sql(), query.params()).await {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_db_query("error");
                tracing::warn!(error = %e, "Query failed");
                return Err(e);
            }
        };

        match query.decode(raw) {
            Ok(value) => {
                metrics::record_db_query("ok");
                Ok(value)
            }
            Err(e) => {
                metrics::record_db_query("decode_error");
                tracing::error!(error = %e, "Row decoding failed; schema and record definitions disagree");
                Err(e)
            }
        }
    }

    /// True if a connection was opened and not yet released.
    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Release the connection, if one was acquired.
    ///
    /// Returns true if this call closed a connection. Later statements fail
    /// with `DbError::Released`.
    pub async fn release(&self) -> bool {
        self.released.store(true, Ordering::Release);
        let connection = self.connection.lock().await.take();
        finish(connection)
    }
}

impl<D: Database> Drop for DbHandle<D> {
    fn drop(&mut self) {
        let connection = self.connection.get_mut().take();
        if connection.is_some() {
            tracing::warn!("Database connection released on drop (request ended early)");
        }
        finish(connection);
    }
}

fn finish<C>(connection: Option<C>) -> bool {
    match connection {
        Some(connection) => {
            drop(connection);
            metrics::record_db_release();
            tracing::debug!("Database connection released");
            true
        }
        None => false,
    }
}

//! Deadlines for outbound calls.
//!
//! # Responsibilities
//! - Bound every call to an external collaborator by a deadline
//! - Turn an elapsed deadline into the caller's own error type
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the timed-out future is dropped
//! - Timeout errors are distinct from transport errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A call ran past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} exceeded its {deadline:?} deadline")]
pub struct DeadlineExceeded {
    pub operation: &'static str,
    pub deadline: Duration,
}

/// Run `future`, failing with `DeadlineExceeded` once `deadline` passes.
pub async fn with_deadline<T, E, F>(operation: &'static str, deadline: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?deadline, "Deadline exceeded");
            Err(DeadlineExceeded { operation, deadline }.into())
        }
    }
}

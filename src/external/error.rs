//! External call errors.

use thiserror::Error;

use crate::resilience::timeouts::DeadlineExceeded;

/// Failure of an outbound call.
///
/// Cloneable so it can travel inside a `Promise`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalError {
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    /// Could not reach the service.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("rejected with status {status}")]
    Rejected { status: u16 },

    /// The service's answer could not be understood.
    #[error("malformed response: {0}")]
    Decode(String),
}

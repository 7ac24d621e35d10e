//! Outbound collaborator calls.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → IdentityProvider::exchange(code)
//!     → spawned task: HTTP call wrapped in resilience::timeouts::with_deadline
//!     → Promise<Result<Identity, ExternalError>>
//!     → on_complete continuation branches on the Result
//! ```
//!
//! # Design Decisions
//! - Calls never fail the request directly; errors are values in the promise
//! - Every call carries the configured external deadline

pub mod error;
pub mod identity;

pub use error::ExternalError;
pub use identity::{HttpIdentityProvider, Identity, IdentityProvider, StaticIdentityProvider};

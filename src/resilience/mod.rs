//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (identity provider, ...):
//!     → timeouts.rs (deadline from timeouts.external_secs)
//!     → Result delivered through the call's Promise
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - The whole request is bounded separately by the HTTP timeout layer

pub mod timeouts;

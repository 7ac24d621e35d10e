//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query, body)
//!     → request.rs (split + decode into a Request fragment)
//!     → router.rs (choice over every endpoint grammar)
//!     → Return: typed Route or None (not found)
//!
//! Outgoing link:
//!     Route value
//!     → router.rs (print through the same grammar)
//!     → request.rs (encode path + query)
//!     → "/episodes/42?t=90"
//! ```
//!
//! # Design Decisions
//! - One grammar is the single source of truth for dispatch and links
//! - Grammars are built once at startup, immutable at runtime, shared via Arc
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)
//! - A miss is a value (`None`), never an error

pub mod description;
pub mod matcher;
pub mod params;
pub mod request;
pub mod router;

pub use description::{Description, RouteDescription, Segment};
pub use matcher::{capture, constant, empty, method, optional_query_param, query_param};
pub use params::Param;
pub use request::Request;
pub use router::{choice, sequence, transform, Router};

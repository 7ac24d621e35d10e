//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → cookie.rs (extract session id)
//!     → store.rs (look up live session, drop expired)
//!     → Environment (session + CSRF token for the request)
//!
//! Posted form
//!     → csrf.rs (parse form, compare token in constant time)
//! ```
//!
//! # Design Decisions
//! - The cookie carries only an opaque id; everything else stays server-side
//! - Each session owns one CSRF token for its whole lifetime
//! - Expiry is checked on read, not by a sweeper

pub mod cookie;
pub mod csrf;
pub mod store;

pub use csrf::PostedForm;
pub use store::{Session, SessionStore};

//! Effect interpreter subsystem.
//!
//! # Data Flow
//! ```text
//! Route
//!     → site handler (builds a Handler<I>, touching nothing yet)
//!     → Handler::run(interpreter)
//!         → derived.rs (session, database, CSRF) on top of
//!         → capability.rs primitives (respond / serve_file / redirect,
//!           on_complete, with_posted_body)
//!         → environment.rs (lazy session lookup, lazy DB connection)
//!     → exactly one Response
//!     → Environment::finish (connection released once)
//! ```
//!
//! # Design Decisions
//! - Handlers are written against trait bounds, never a concrete backend;
//!   the axum backend and the test backend run the same handler code
//! - Suspension happens only at `on_complete`/`execute`, and each
//!   continuation runs after the previous step finishes (program order)
//! - External results arrive as `Promise`s carrying `Result`s

pub mod capability;
pub mod derived;
pub mod environment;
pub mod handler;
pub mod promise;
pub mod testing;

pub use capability::Interpreter;
pub use derived::{CsrfCapability, DatabaseCapability, SessionCapability};
pub use environment::{Environment, RequestScope};
pub use handler::Handler;
pub use promise::{Promise, Resolver};
pub use testing::{Outcome, TestInterpreter};

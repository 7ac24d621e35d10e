//! The site: routes, records and handlers built on the core.
//!
//! # Data Flow
//! ```text
//! Request
//!     → route.rs (site grammar) → Route
//!     → handlers.rs (Route → Handler<I>)
//!     → serve(): run against the interpreter, then release the request's
//!       database connection
//! ```

pub mod handlers;
pub mod records;
pub mod route;
pub mod schema;

pub use handlers::handle;
pub use route::{router, EpisodeId, Route};

use crate::interpreter::Interpreter;

/// Run `route`'s handler to its single response, then end the request.
pub async fn serve<I: Interpreter>(interpreter: I, route: Route) -> I::Response {
    let response = handle::<I>(route).run(interpreter.clone()).await;
    interpreter.environment().finish().await;
    response
}

//! Content server library.
//!
//! The request-handling core is three pieces: a bidirectional route grammar
//! (`routing`), an injection-safe query builder with typed row decoding
//! (`db`), and a backend-agnostic effect interpreter (`interpreter`). The
//! `site` module is the thin surface built on them; `http` runs it on axum.

// Core
pub mod db;
pub mod interpreter;
pub mod routing;

// Application
pub mod app;
pub mod external;
pub mod session;
pub mod site;

// Serving
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use app::AppContext;
pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

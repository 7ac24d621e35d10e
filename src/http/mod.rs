//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, fallback handler)
//!     → request.rs (request id, body, cookie → routing Request + scope)
//!     → site grammar → Route → handler
//!     → response.rs (AxumInterpreter: respond / serve_file / redirect)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::AxumInterpreter;
pub use server::HttpServer;

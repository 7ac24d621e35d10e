//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Logging/metrics → Schema check → Bind → Serve
//!
//! Shutdown:
//!     Ctrl+C or Shutdown::trigger (signals.rs / shutdown.rs)
//!     → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then database, then listener
//! - Schema drift aborts startup before the listener binds

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

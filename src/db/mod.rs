//! Database access subsystem.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → query.rs (Sql builder: raw syntax + identifiers + placeholders)
//!     → Query<A> (sql text, ordered params, decoder)
//!     → connection.rs (request-scoped DbHandle, lazy connect)
//!     → backend (memory.rs or any Database impl)
//!     → RawRows
//!     → row.rs / record.rs (decode by field name)
//!     → Result<A, DbError>
//! ```
//!
//! # Design Decisions
//! - Values only ever enter SQL text as `$n` placeholders
//! - Decoding is generated per type, no runtime reflection
//! - Schema drift is checked at startup (schema.rs); at query time it is a
//!   typed `DbError::Decode`, never a process abort
//! - One connection per request, released exactly once

pub mod connection;
pub mod error;
pub mod memory;
pub mod query;
pub mod record;
pub mod row;
pub mod schema;
pub mod value;

pub use connection::{Connection, Database, DbHandle};
pub use error::{DbError, DbResult, DecodeError};
pub use memory::MemoryDatabase;
pub use query::{Query, RawRows, Sql};
pub use record::{Record, Row};
pub use row::{column_name, FromRow, RowReader, ToRow};
pub use value::{FromSql, SqlValue, ToSql};

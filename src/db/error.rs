//! Database error definitions.

use thiserror::Error;

/// A result row did not have the shape the target type expects.
///
/// This means the schema and the record definition have drifted apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("column `{column}` missing while decoding `{record}`")]
    MissingColumn { column: String, record: &'static str },

    #[error("column `{column}` of `{record}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        record: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected exactly one row, found {0}")]
    RowCount(usize),
}

/// Errors surfaced to handlers from query execution.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// Could not obtain a connection.
    #[error("database connection failed: {0}")]
    Connect(String),

    /// The backend rejected the statement.
    #[error("query failed: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    /// The statement ran but its rows could not be decoded.
    #[error("decoding failed: {source} (sql: {sql})")]
    Decode {
        sql: String,
        #[source]
        source: DecodeError,
    },

    /// A table is missing columns a record type reads.
    #[error("table `{table}` is missing columns {missing:?}")]
    SchemaDrift { table: String, missing: Vec<String> },

    /// The statement shape is not understood by this backend.
    #[error("unsupported statement: {sql}")]
    Unsupported { sql: String },

    /// The request's handle was already released.
    #[error("database handle already released")]
    Released,
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

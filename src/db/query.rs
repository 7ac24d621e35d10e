//! Parameterized query building.
//!
//! # Responsibilities
//! - Assemble SQL text from static syntax, validated identifiers and
//!   placeholders
//! - Number placeholders (`$1`, `$2`, ...) in append order
//! - Pair each statement with the decoder for its result rows
//!
//! # Design Decisions
//! - `raw` only accepts `&'static str`: literal syntax is written in code,
//!   never formatted from data
//! - `parameter` is the only way a value enters a statement, and it always
//!   becomes a placeholder plus an entry in the bound-value list
//! - Identifiers are checked against `[A-Za-z_][A-Za-z0-9_]*` and quoted

use std::fmt;
use std::sync::Arc;

use crate::db::error::{DbError, DecodeError};
use crate::db::row::{FromRow, RowReader};
use crate::db::value::{SqlValue, ToSql};

/// Rows returned by a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    /// Rows touched by a write; equals `rows.len()` for reads.
    pub affected: u64,
}

impl RawRows {
    pub fn iter(&self) -> impl Iterator<Item = RowReader<'_>> {
        self.rows.iter().map(|values| RowReader::new(&self.columns, values))
    }
}

#[derive(Debug, Clone)]
enum Part {
    Raw(&'static str),
    Identifier(String),
    Parameter(SqlValue),
}

/// A statement under construction.
#[derive(Debug, Clone, Default)]
pub struct Sql {
    parts: Vec<Part>,
}

impl Sql {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal SQL syntax.
    pub fn raw(mut self, text: &'static str) -> Self {
        self.parts.push(Part::Raw(text));
        self
    }

    /// Append a schema-fixed table or column name.
    ///
    /// # Panics
    /// If `name` is not a plain identifier. Identifiers come from code, so
    /// an invalid one is a programming error.
    pub fn identifier(mut self, name: &str) -> Self {
        assert!(is_identifier(name), "invalid SQL identifier: {name:?}");
        self.parts.push(Part::Identifier(name.to_string()));
        self
    }

    /// Append a comma-separated identifier list.
    pub fn identifiers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                self = self.raw(", ");
            }
            self = self.identifier(name.as_ref());
        }
        self
    }

    /// Append a placeholder bound to `value`.
    pub fn parameter(mut self, value: impl ToSql) -> Self {
        self.parts.push(Part::Parameter(value.to_sql()));
        self
    }

    /// Append another fragment; its placeholders are renumbered.
    pub fn append(mut self, other: Sql) -> Self {
        self.parts.extend(other.parts);
        self
    }

    /// Render SQL text and the ordered bound values.
    pub fn render(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for part in &self.parts {
            match part {
                Part::Raw(text) => sql.push_str(text),
                Part::Identifier(name) => {
                    sql.push('"');
                    sql.push_str(name);
                    sql.push('"');
                }
                Part::Parameter(value) => {
                    params.push(value.clone());
                    sql.push('$');
                    sql.push_str(&params.len().to_string());
                }
            }
        }
        (sql, params)
    }

    /// Finish as a statement whose result is the affected row count.
    pub fn finish(self) -> Query<u64> {
        let (sql, params) = self.render();
        Query::from_rendered(sql, params)
    }

    pub fn fetch_all<T: FromRow + 'static>(self) -> Query<Vec<T>> {
        self.finish().fetch_all()
    }

    pub fn fetch_one<T: FromRow + 'static>(self) -> Query<T> {
        self.finish().fetch_one()
    }

    pub fn fetch_optional<T: FromRow + 'static>(self) -> Query<Option<T>> {
        self.finish().fetch_optional()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

type DecodeFn<A> = dyn Fn(RawRows) -> Result<A, DecodeError> + Send + Sync;

/// A finished statement plus the decoder for its result.
pub struct Query<A> {
    sql: String,
    params: Vec<SqlValue>,
    decode: Arc<DecodeFn<A>>,
}

impl<A> Clone for Query<A> {
    fn clone(&self) -> Self {
        Self {
            sql: self.sql.clone(),
            params: self.params.clone(),
            decode: self.decode.clone(),
        }
    }
}

impl<A> fmt::Debug for Query<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}

impl Query<u64> {
    /// A statement written by hand with explicit `$n` placeholders.
    ///
    /// The text must be a literal; every value goes through `params`.
    pub fn build(sql: &'static str, params: Vec<SqlValue>) -> Self {
        Self::from_rendered(sql.to_string(), params)
    }

    fn from_rendered(sql: String, params: Vec<SqlValue>) -> Self {
        Self {
            sql,
            params,
            decode: Arc::new(|raw: RawRows| Ok(raw.affected)),
        }
    }
}

impl<A: 'static> Query<A> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Decode backend rows, attaching the statement text to failures.
    pub fn decode(&self, raw: RawRows) -> Result<A, DbError> {
        (self.decode)(raw).map_err(|source| DbError::Decode {
            sql: self.sql.clone(),
            source,
        })
    }

    /// Replace the decoder.
    pub fn returning<B, F>(self, decode: F) -> Query<B>
    where
        F: Fn(RawRows) -> Result<B, DecodeError> + Send + Sync + 'static,
    {
        Query {
            sql: self.sql,
            params: self.params,
            decode: Arc::new(decode),
        }
    }

    /// Transform the decoded value.
    pub fn map<B, F>(self, f: F) -> Query<B>
    where
        B: 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let decode = self.decode.clone();
        self.returning(move |raw| decode(raw).map(&f))
    }

    pub fn fetch_all<T: FromRow + 'static>(self) -> Query<Vec<T>> {
        self.returning(|raw| raw.iter().map(|row| T::from_row(&row)).collect())
    }

    pub fn fetch_one<T: FromRow + 'static>(self) -> Query<T> {
        self.returning(|raw| match raw.rows.len() {
            1 => raw.iter().map(|row| T::from_row(&row)).next().unwrap_or(Err(DecodeError::RowCount(0))),
            n => Err(DecodeError::RowCount(n)),
        })
    }

    pub fn fetch_optional<T: FromRow + 'static>(self) -> Query<Option<T>> {
        self.returning(|raw| match raw.rows.len() {
            0 => Ok(None),
            1 => raw.iter().map(|row| T::from_row(&row)).next().transpose(),
            n => Err(DecodeError::RowCount(n)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Name {
        name: String,
    }

    crate::impl_record_fields!(Name { name });

    #[test]
    fn test_placeholders_number_in_append_order() {
        let (sql, params) = Sql::new()
            .raw("UPDATE ")
            .identifier("users")
            .raw(" SET ")
            .identifier("name")
            .raw(" = ")
            .parameter("Ada")
            .raw(" WHERE ")
            .identifier("id")
            .raw(" = ")
            .parameter(7i64)
            .render();
        assert_eq!(sql, "UPDATE \"users\" SET \"name\" = $1 WHERE \"id\" = $2");
        assert_eq!(params, vec![SqlValue::Text("Ada".into()), SqlValue::Int(7)]);
    }

    #[test]
    fn test_metacharacters_only_in_params() {
        let hostile = "'; DROP TABLE users; --";
        let (sql, params) = Sql::new()
            .raw("SELECT * FROM ")
            .identifier("users")
            .raw(" WHERE ")
            .identifier("name")
            .raw(" = ")
            .parameter(hostile)
            .render();
        assert!(!sql.contains(hostile));
        assert!(!sql.contains('\''));
        assert!(!sql.contains("--"));
        assert!(sql.ends_with("= $1"));
        assert_eq!(params, vec![SqlValue::Text(hostile.into())]);
    }

    #[test]
    fn test_append_renumbers() {
        let filter = Sql::new().raw(" WHERE ").identifier("id").raw(" = ").parameter(2i64);
        let (sql, params) = Sql::new()
            .raw("UPDATE ")
            .identifier("t")
            .raw(" SET ")
            .identifier("x")
            .raw(" = ")
            .parameter(1i64)
            .append(filter)
            .render();
        assert!(sql.ends_with("\"id\" = $2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    #[should_panic(expected = "invalid SQL identifier")]
    fn test_identifier_rejects_injection() {
        let _ = Sql::new().identifier("users; DROP TABLE users");
    }

    #[test]
    fn test_fetch_one_counts_rows() {
        let query = Sql::new().raw("SELECT 1").fetch_one::<Name>();
        let raw = RawRows {
            columns: vec!["name".into()],
            rows: vec![],
            affected: 0,
        };
        assert!(matches!(
            query.decode(raw),
            Err(DbError::Decode { source: DecodeError::RowCount(0), .. })
        ));
    }

    #[test]
    fn test_fetch_optional_decodes() {
        let query = Sql::new().raw("SELECT 1").fetch_optional::<Name>();
        let raw = RawRows {
            columns: vec!["name".into()],
            rows: vec![vec![SqlValue::Text("Ada".into())]],
            affected: 1,
        };
        assert_eq!(query.decode(raw).unwrap(), Some(Name { name: "Ada".into() }));
    }

    #[test]
    fn test_build_keeps_text() {
        let q = Query::build("DELETE FROM \"users\" WHERE \"id\" = $1", vec![SqlValue::Int(1)]);
        assert_eq!(q.params().len(), 1);
        assert_eq!(q.decode(RawRows { affected: 3, ..Default::default() }).unwrap(), 3);
    }
}

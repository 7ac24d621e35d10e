//! Structural row decoding.
//!
//! # Responsibilities
//! - Map record fields to columns by name (lower_snake_case)
//! - Decode a result row into a record, field by field
//! - Encode a record back into `(column, value)` pairs for writes
//!
//! # Design Decisions
//! - No runtime reflection: `impl_record_fields!` generates the per-type
//!   mapping once, at compile time
//! - Missing or mistyped columns are reported with the column, record and
//!   expected/found kinds; nothing is defaulted

use crate::db::error::DecodeError;
use crate::db::value::{FromSql, SqlValue};

/// Convert a field name to the database column convention.
///
/// `emailAddress` becomes `email_address`; names already in snake case are
/// unchanged, and raw identifiers (`r#type`) lose their prefix.
pub fn column_name(field: &str) -> String {
    let field = field.strip_prefix("r#").unwrap_or(field);
    let mut out = String::with_capacity(field.len() + 4);
    let mut prev_lower = false;
    for ch in field.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// A borrowed view of one result row.
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> RowReader<'a> {
    pub fn new(columns: &'a [String], values: &'a [SqlValue]) -> Self {
        Self { columns, values }
    }

    /// Raw value of a column, by exact column name.
    pub fn value(&self, column: &str) -> Option<&'a SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Decode the column backing `field` of `record`.
    pub fn field<T: FromSql>(&self, record: &'static str, field: &str) -> Result<T, DecodeError> {
        let column = column_name(field);
        let value = self.value(&column).ok_or_else(|| DecodeError::MissingColumn {
            column: column.clone(),
            record,
        })?;
        T::from_sql(value).ok_or_else(|| DecodeError::TypeMismatch {
            column,
            record,
            expected: T::KIND,
            found: value.kind(),
        })
    }
}

/// Types decoded from a single result row.
pub trait FromRow: Sized {
    fn from_row(row: &RowReader<'_>) -> Result<Self, DecodeError>;

    /// Columns this type reads, in field order.
    fn columns() -> Vec<String>;
}

/// Types written as a set of column assignments.
pub trait ToRow {
    fn to_row(&self) -> Vec<(String, SqlValue)>;
}

impl<A: FromRow, B: FromRow> FromRow for (A, B) {
    fn from_row(row: &RowReader<'_>) -> Result<Self, DecodeError> {
        Ok((A::from_row(row)?, B::from_row(row)?))
    }

    fn columns() -> Vec<String> {
        let mut columns = A::columns();
        columns.extend(B::columns());
        columns
    }
}

/// Generate `FromRow` and `ToRow` for a plain struct from its field list.
///
/// ```ignore
/// pub struct UserData { pub name: String, pub email: String }
/// impl_record_fields!(UserData { name, email });
/// ```
#[macro_export]
macro_rules! impl_record_fields {
    ($record:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::db::FromRow for $record {
            fn from_row(row: &$crate::db::RowReader<'_>) -> Result<Self, $crate::db::DecodeError> {
                Ok(Self {
                    $( $field: row.field(stringify!($record), stringify!($field))?, )+
                })
            }

            fn columns() -> Vec<String> {
                vec![$( $crate::db::column_name(stringify!($field)) ),+]
            }
        }

        impl $crate::db::ToRow for $record {
            fn to_row(&self) -> Vec<(String, $crate::db::SqlValue)> {
                vec![$(
                    (
                        $crate::db::column_name(stringify!($field)),
                        $crate::db::ToSql::to_sql(&self.$field),
                    )
                ),+]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::value::ToSql;

    #[derive(Debug, PartialEq)]
    struct Profile {
        display_name: String,
        age: Option<i32>,
    }

    crate::impl_record_fields!(Profile { display_name, age });

    fn row(columns: &[&str], values: Vec<SqlValue>) -> (Vec<String>, Vec<SqlValue>) {
        (columns.iter().map(|c| c.to_string()).collect(), values)
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("emailAddress"), "email_address");
        assert_eq!(column_name("email_address"), "email_address");
        assert_eq!(column_name("r#type"), "type");
        assert_eq!(column_name("episode2Id"), "episode2_id");
    }

    #[test]
    fn test_decode_by_name_ignores_order() {
        let (columns, values) = row(&["age", "display_name"], vec![SqlValue::Null, "Ada".to_sql()]);
        let profile = Profile::from_row(&RowReader::new(&columns, &values)).unwrap();
        assert_eq!(profile, Profile { display_name: "Ada".into(), age: None });
    }

    #[test]
    fn test_missing_column_is_specific() {
        let (columns, values) = row(&["display_name"], vec!["Ada".to_sql()]);
        let err = Profile::from_row(&RowReader::new(&columns, &values)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingColumn {
                column: "age".into(),
                record: "Profile"
            }
        );
    }

    #[test]
    fn test_type_mismatch_is_specific() {
        let (columns, values) = row(&["display_name", "age"], vec![SqlValue::Int(3), SqlValue::Null]);
        let err = Profile::from_row(&RowReader::new(&columns, &values)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch { ref column, expected: "text", found: "int", .. } if column == "display_name"
        ));
    }

    #[test]
    fn test_to_row_uses_column_names() {
        let profile = Profile { display_name: "Ada".into(), age: Some(36) };
        assert_eq!(
            profile.to_row(),
            vec![
                ("display_name".to_string(), SqlValue::Text("Ada".into())),
                ("age".to_string(), SqlValue::Int(36)),
            ]
        );
        assert_eq!(Profile::columns(), vec!["display_name", "age"]);
    }
}

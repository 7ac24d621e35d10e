//! Bound parameter values and their conversions.

use serde::Serialize;
use uuid::Uuid;

/// A value crossing the database boundary, either as a bound parameter or
/// as a column in a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl SqlValue {
    /// Type name used in decode diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Json(_) => "json",
        }
    }
}

/// Conversion into a bound parameter.
pub trait ToSql {
    fn to_sql(&self) -> SqlValue;
}

/// Conversion out of a result column.
pub trait FromSql: Sized {
    /// Expected column kind, reported when decoding fails.
    const KIND: &'static str;

    fn from_sql(value: &SqlValue) -> Option<Self>;
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> SqlValue {
        self.clone()
    }
}

impl FromSql for SqlValue {
    const KIND: &'static str = "any";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl ToSql for bool {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl FromSql for bool {
    const KIND: &'static str = "bool";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! int_sql {
    ($($ty:ty),*) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }
            }

            impl FromSql for $ty {
                const KIND: &'static str = "int";

                fn from_sql(value: &SqlValue) -> Option<Self> {
                    match value {
                        SqlValue::Int(n) => <$ty>::try_from(*n).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_sql!(i16, i32, i64, u16, u32);

impl ToSql for f64 {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl FromSql for f64 {
    const KIND: &'static str = "float";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl ToSql for str {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSql for String {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl FromSql for String {
    const KIND: &'static str = "text";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ToSql for Uuid {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Uuid(*self)
    }
}

impl FromSql for Uuid {
    const KIND: &'static str = "uuid";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl ToSql for serde_json::Value {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }
}

impl FromSql for serde_json::Value {
    const KIND: &'static str = "json";

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Json(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> SqlValue {
        match self {
            Some(v) => v.to_sql(),
            None => SqlValue::Null,
        }
    }
}

impl<T: FromSql> FromSql for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_sql(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            v => T::from_sql(v).map(Some),
        }
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> SqlValue {
        (**self).to_sql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_null_roundtrip() {
        let none: Option<String> = None;
        assert_eq!(none.to_sql(), SqlValue::Null);
        assert_eq!(Option::<String>::from_sql(&SqlValue::Null), Some(None));
        assert_eq!(Option::<String>::from_sql(&SqlValue::Int(1)), None);
    }

    #[test]
    fn test_int_out_of_range() {
        assert_eq!(u32::from_sql(&SqlValue::Int(-1)), None);
        assert_eq!(i32::from_sql(&SqlValue::Int(7)), Some(7));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SqlValue::Text("x".into()).kind(), "text");
        assert_eq!(SqlValue::Null.kind(), "null");
    }
}

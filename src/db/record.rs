//! Identified records and the queries that read and write them.

use std::fmt::Debug;

use uuid::Uuid;

use crate::db::error::DecodeError;
use crate::db::query::{Query, Sql};
use crate::db::row::{FromRow, RowReader, ToRow};
use crate::db::value::{FromSql, ToSql};

/// A record stored in its own table, keyed by an `id` column.
pub trait Record: FromRow + ToRow + Send + Sync + 'static {
    const TABLE: &'static str;

    type Id: FromSql + ToSql + Clone + Debug + PartialEq + Send + Sync + 'static;
}

/// A decoded record together with its id.
///
/// The id is fixed once read; changing the payload means issuing
/// `Row::update`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<E: Record> {
    id: E::Id,
    data: E,
}

impl<E: Record> Row<E> {
    pub fn id(&self) -> &E::Id {
        &self.id
    }

    pub fn data(&self) -> &E {
        &self.data
    }

    pub fn into_data(self) -> E {
        self.data
    }

    /// Statement replacing this row's payload with `data`.
    pub fn update(&self, data: &E) -> Query<Option<Row<E>>> {
        update::<E>(&self.id, data)
    }
}

impl<E: Record> FromRow for Row<E> {
    fn from_row(row: &RowReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: row.field(E::TABLE, "id")?,
            data: E::from_row(row)?,
        })
    }

    fn columns() -> Vec<String> {
        let mut columns = vec!["id".to_string()];
        columns.extend(E::columns());
        columns
    }
}

/// `SELECT * FROM table`
pub fn select_all<E: Record>() -> Query<Vec<Row<E>>> {
    Sql::new().raw("SELECT * FROM ").identifier(E::TABLE).fetch_all()
}

/// `SELECT * FROM table WHERE id = $1`
pub fn select_by_id<E: Record>(id: &E::Id) -> Query<Option<Row<E>>> {
    Sql::new()
        .raw("SELECT * FROM ")
        .identifier(E::TABLE)
        .raw(" WHERE ")
        .identifier("id")
        .raw(" = ")
        .parameter(id)
        .fetch_optional()
}

/// `SELECT * FROM table WHERE column = $1`
pub fn select_where<E: Record>(column: &str, value: impl ToSql) -> Query<Vec<Row<E>>> {
    Sql::new()
        .raw("SELECT * FROM ")
        .identifier(E::TABLE)
        .raw(" WHERE ")
        .identifier(column)
        .raw(" = ")
        .parameter(value)
        .fetch_all()
}

/// `INSERT INTO table (..) VALUES (..) RETURNING *`, letting the database
/// assign the id. Databases generate UUID keys; records keyed otherwise go
/// through `insert_with_id`.
pub fn insert<E: Record<Id = Uuid>>(data: &E) -> Query<Row<E>> {
    let assignments = data.to_row();
    let mut sql = Sql::new()
        .raw("INSERT INTO ")
        .identifier(E::TABLE)
        .raw(" (")
        .identifiers(assignments.iter().map(|(column, _)| column))
        .raw(") VALUES (");
    for (i, (_, value)) in assignments.into_iter().enumerate() {
        if i > 0 {
            sql = sql.raw(", ");
        }
        sql = sql.parameter(value);
    }
    sql.raw(") RETURNING *").fetch_one()
}

/// `INSERT INTO table (id, ..) VALUES (..) RETURNING *` with a caller-chosen id.
pub fn insert_with_id<E: Record>(id: &E::Id, data: &E) -> Query<Row<E>> {
    let mut sql = Sql::new()
        .raw("INSERT INTO ")
        .identifier(E::TABLE)
        .raw(" (")
        .identifier("id");
    let assignments = data.to_row();
    for (column, _) in &assignments {
        sql = sql.raw(", ").identifier(column);
    }
    sql = sql.raw(") VALUES (").parameter(id);
    for (_, value) in assignments {
        sql = sql.raw(", ").parameter(value);
    }
    sql.raw(") RETURNING *").fetch_one()
}

/// `UPDATE table SET .. WHERE id = $n RETURNING *`
pub fn update<E: Record>(id: &E::Id, data: &E) -> Query<Option<Row<E>>> {
    let mut sql = Sql::new().raw("UPDATE ").identifier(E::TABLE).raw(" SET ");
    for (i, (column, value)) in data.to_row().into_iter().enumerate() {
        if i > 0 {
            sql = sql.raw(", ");
        }
        sql = sql.identifier(&column).raw(" = ").parameter(value);
    }
    sql.raw(" WHERE ")
        .identifier("id")
        .raw(" = ")
        .parameter(id)
        .raw(" RETURNING *")
        .fetch_optional()
}

/// `DELETE FROM table WHERE id = $1`
pub fn delete<E: Record>(id: &E::Id) -> Query<u64> {
    Sql::new()
        .raw("DELETE FROM ")
        .identifier(E::TABLE)
        .raw(" WHERE ")
        .identifier("id")
        .raw(" = ")
        .parameter(id)
        .finish()
}

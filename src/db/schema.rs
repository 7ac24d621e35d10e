//! Startup schema verification.
//!
//! Record definitions are checked against the live tables once, before the
//! server accepts traffic, so drift fails the deploy instead of a request.

use crate::db::connection::{Connection, Database};
use crate::db::error::DbError;
use crate::db::query::Sql;
use crate::db::record::{Record, Row};
use crate::db::row::FromRow;

/// Check that `E`'s table has every column `Row<E>` decodes.
pub async fn verify<E: Record, D: Database>(database: &D) -> Result<(), DbError> {
    let probe = Sql::new().raw("SELECT * FROM ").identifier(E::TABLE).raw(" LIMIT 0").finish();
    let mut connection = database.connect().await?;
    let raw = connection.query(probe.sql(), probe.params()).await?;

    let missing: Vec<String> = Row::<E>::columns()
        .into_iter()
        .filter(|column| !raw.columns.contains(column))
        .collect();

    if missing.is_empty() {
        tracing::debug!(table = E::TABLE, "Schema verified");
        Ok(())
    } else {
        Err(DbError::SchemaDrift {
            table: E::TABLE.to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;

    #[derive(Debug, Clone, PartialEq)]
    struct Gift {
        months: i32,
        message: Option<String>,
    }

    crate::impl_record_fields!(Gift { months, message });

    impl Record for Gift {
        const TABLE: &'static str = "gifts";
        type Id = uuid::Uuid;
    }

    #[tokio::test]
    async fn test_verify_passes_matching_table() {
        let db = MemoryDatabase::new().with_table("gifts", &["id", "months", "message", "extra"]);
        verify::<Gift, _>(&db).await.unwrap();
        assert_eq!(db.connections_open(), 0);
    }

    #[tokio::test]
    async fn test_verify_reports_missing_columns() {
        let db = MemoryDatabase::new().with_table("gifts", &["id", "months"]);
        let err = verify::<Gift, _>(&db).await.unwrap_err();
        match err {
            DbError::SchemaDrift { table, missing } => {
                assert_eq!(table, "gifts");
                assert_eq!(missing, vec!["message".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_verify_missing_table() {
        let db = MemoryDatabase::new();
        assert!(matches!(verify::<Gift, _>(&db).await, Err(DbError::Query { .. })));
    }
}

//! Site tables: creation for the in-memory backend, verification for any
//! backend, and a small sample catalogue.

use uuid::Uuid;

use crate::db::record::{insert, insert_with_id};
use crate::db::schema::verify;
use crate::db::{Database, DbError, DbHandle, FromRow, MemoryDatabase, Record, Row};
use crate::site::records::{Collection, Episode, Gift, User};

fn create<E: Record>(database: &MemoryDatabase) {
    let columns = Row::<E>::columns();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    database.create_table(E::TABLE, &columns);
}

/// Create every site table in `database`.
pub fn install(database: &MemoryDatabase) {
    create::<User>(database);
    create::<Episode>(database);
    create::<Collection>(database);
    create::<Gift>(database);
}

/// Check every record type against its table.
pub async fn verify_all<D: Database>(database: &D) -> Result<(), DbError> {
    verify::<User, D>(database).await?;
    verify::<Episode, D>(database).await?;
    verify::<Collection, D>(database).await?;
    verify::<Gift, D>(database).await?;
    tracing::info!("Site schema verified");
    Ok(())
}

/// Insert a sample collection, its episodes and one gift.
pub async fn seed<D: Database>(database: &D) -> Result<Uuid, DbError> {
    let handle = DbHandle::new(database.clone());
    handle
        .run(&insert(&Collection {
            slug: "server-side-rust".into(),
            title: "Server-Side Rust".into(),
            description: "Building a web server from routing to the database.".into(),
        }))
        .await?;

    let episodes = [
        (1, "Routing", "A grammar that parses requests and prints links.", 1260, false),
        (2, "Queries", "Parameterized SQL and typed row decoding.", 1500, true),
        (3, "Effects", "Handlers that run against any backend.", 1380, true),
    ];
    for (number, title, synopsis, media_duration, subscription_only) in episodes {
        handle
            .run(&insert_with_id(
                &i64::from(number),
                &Episode {
                    number,
                    title: title.into(),
                    synopsis: synopsis.into(),
                    media_duration,
                    collection: "server-side-rust".into(),
                    subscription_only,
                },
            ))
            .await?;
    }

    let gift = handle
        .run(&insert(&Gift {
            gifter_email: "gifter@example.com".into(),
            months: 12,
            message: Some("Enjoy!".into()),
            redeemed_by: None,
        }))
        .await?;
    handle.release().await;

    tracing::info!(gift_id = %gift.id(), "Sample content seeded");
    Ok(*gift.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::record::select_all;

    #[tokio::test]
    async fn test_install_then_verify() {
        let db = MemoryDatabase::new();
        install(&db);
        verify_all(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_detects_drift() {
        let db = MemoryDatabase::new();
        install(&db);
        db.create_table("gifts", &["id", "months"]);
        assert!(matches!(verify_all(&db).await, Err(DbError::SchemaDrift { .. })));
    }

    #[tokio::test]
    async fn test_seed() {
        let db = MemoryDatabase::new();
        install(&db);
        seed(&db).await.unwrap();

        let handle = DbHandle::new(db.clone());
        let episodes = handle.run(&select_all::<Episode>()).await.unwrap();
        assert_eq!(episodes.len(), 3);
        assert_eq!(*episodes[1].id(), 2);
        handle.release().await;
        assert_eq!(db.connections_open(), 0);
    }
}

//! Database configuration module.
//!
//! This module handles the `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The only hand-built statement is the
//! unique index that deduplicates replayed WebSMS messages.

use crate::entities::{
    Asset, Group, Transaction, User, UserApiKey, UserGroupAccess, WebSmsApiKey, WebSmsLog,
    user_group_access, websms_log,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Name of the unique index on `(group_id, received_at, text)`
pub const WEBSMS_DEDUP_INDEX: &str = "idx_websms_logs_dedup";

/// One grant per `(user_id, group_id)`
const GRANT_INDEX: &str = "idx_user_group_access_unique";

/// Establishes a connection to the database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all tables (if missing) using `SeaORM`'s schema generation.
///
/// Tables are created parents first so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, Group),
        table_for(&schema, User),
        table_for(&schema, UserGroupAccess),
        table_for(&schema, WebSmsApiKey),
        table_for(&schema, UserApiKey),
        table_for(&schema, Asset),
        table_for(&schema, WebSmsLog),
        table_for(&schema, Transaction),
    ];
    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    let dedup_index = Index::create()
        .name(WEBSMS_DEDUP_INDEX)
        .table(WebSmsLog)
        .col(websms_log::Column::GroupId)
        .col(websms_log::Column::ReceivedAt)
        .col(websms_log::Column::Text)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&dedup_index)).await?;

    let grant_index = Index::create()
        .name(GRANT_INDEX)
        .table(UserGroupAccess)
        .col(user_group_access::Column::UserId)
        .col(user_group_access::Column::GroupId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&grant_index)).await?;

    info!("Database tables ensured");
    Ok(())
}

//! Shared test utilities for cashflow.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::asset::{NewAsset, create_asset},
    entities::{
        self, AssetType, Role, User, group, user, user_api_key, user_group_access, websms_api_key,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A fixed, second-aligned instant (2026-03-15 09:30:00 UTC) for deterministic tests.
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Creates a group whose periods start on the 1st.
pub async fn create_test_group(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::GroupModel> {
    group::ActiveModel {
        name: Set(name.to_string()),
        month_start_day: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets up a complete test environment with one group named "family".
/// Returns (db, group) for common test scenarios.
pub async fn setup_with_group() -> Result<(DatabaseConnection, entities::GroupModel)> {
    let db = setup_test_db().await?;
    let group = create_test_group(&db, "family").await?;
    Ok((db, group))
}

/// Creates a card asset with sensible defaults.
///
/// # Defaults
/// * `name`: `"<issuer> <number>"`
/// * `current_balance_cents`: 0
/// * `filter_text`: None
pub async fn create_test_asset(
    db: &DatabaseConnection,
    group_id: i64,
    issuer: &str,
    asset_number: Option<&str>,
) -> Result<entities::AssetModel> {
    create_asset(
        db,
        group_id,
        NewAsset {
            name: format!("{issuer} {}", asset_number.unwrap_or("-")),
            asset_type: AssetType::Card,
            issuer: issuer.to_string(),
            asset_number: asset_number.map(str::to_string),
            filter_text: None,
            current_balance_cents: 0,
        },
    )
    .await
}

/// Creates a user without an active group.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
) -> Result<entities::UserModel> {
    user::ActiveModel {
        username: Set(username.to_string()),
        role: Set(role),
        active_group_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Grants `user_id` access to `group_id`.
pub async fn grant_access(db: &DatabaseConnection, user_id: i64, group_id: i64) -> Result<()> {
    user_group_access::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
        granted_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Makes `group_id` the active group of `user_id`.
pub async fn set_active_group(db: &DatabaseConnection, user_id: i64, group_id: i64) -> Result<()> {
    let Some(found) = User::find_by_id(user_id).one(db).await? else {
        return Ok(());
    };
    let mut active: user::ActiveModel = found.into();
    active.active_group_id = Set(Some(group_id));
    active.update(db).await?;
    Ok(())
}

/// Binds `api_key` to `group_id`.
pub async fn create_test_group_key(
    db: &DatabaseConnection,
    group_id: i64,
    api_key: &str,
) -> Result<entities::WebSmsApiKeyModel> {
    websms_api_key::ActiveModel {
        group_id: Set(group_id),
        api_key: Set(api_key.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Binds `api_key` to `user_id`.
pub async fn create_test_user_key(
    db: &DatabaseConnection,
    user_id: i64,
    api_key: &str,
) -> Result<entities::UserApiKeyModel> {
    user_api_key::ActiveModel {
        user_id: Set(user_id),
        api_key: Set(api_key.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Routes test logs through the test harness; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

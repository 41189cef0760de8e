//! Asset business logic - Lookups, creation and balance updates for assets.
//!
//! Every function is generic over `ConnectionTrait` so it can run either directly on the
//! pool or inside an open database transaction.

use crate::{
    entities::{Asset, AssetType, asset},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Input for creating an asset
#[derive(Debug, Clone, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub asset_type: AssetType,
    pub issuer: String,
    #[serde(default)]
    pub asset_number: Option<String>,
    #[serde(default)]
    pub filter_text: Option<String>,
    #[serde(default)]
    pub current_balance_cents: i64,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Retrieves all assets owned by any of `group_ids`, ordered by id.
///
/// This is the candidate set for matching an incoming message.
pub async fn get_assets_for_groups<C>(db: &C, group_ids: &[i64]) -> Result<Vec<asset::Model>>
where
    C: ConnectionTrait,
{
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }
    Asset::find()
        .filter(asset::Column::GroupId.is_in(group_ids.iter().copied()))
        .order_by_asc(asset::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an asset by id, returning `None` unless it belongs to `group_id`.
pub async fn get_asset_in_group<C>(
    db: &C,
    group_id: i64,
    asset_id: i64,
) -> Result<Option<asset::Model>>
where
    C: ConnectionTrait,
{
    Asset::find_by_id(asset_id)
        .filter(asset::Column::GroupId.eq(group_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an asset in `group_id` after validating the input.
///
/// Name and issuer must be non-blank, and every type except cash needs an
/// `asset_number`. Blank optional strings are stored as `NULL`.
#[instrument(skip(db, new_asset), fields(name = %new_asset.name))]
pub async fn create_asset<C>(db: &C, group_id: i64, new_asset: NewAsset) -> Result<asset::Model>
where
    C: ConnectionTrait,
{
    let name = new_asset.name.trim();
    let issuer = new_asset.issuer.trim();
    if name.is_empty() || issuer.is_empty() {
        return Err(Error::validation("missing required fields"));
    }

    let asset_number = non_blank(new_asset.asset_number.as_deref());
    if new_asset.asset_type.requires_number() && asset_number.is_none() {
        return Err(Error::validation("asset_number is required"));
    }

    let asset = asset::ActiveModel {
        group_id: Set(group_id),
        name: Set(name.to_string()),
        asset_type: Set(new_asset.asset_type),
        issuer: Set(issuer.to_string()),
        asset_number: Set(asset_number),
        filter_text: Set(non_blank(new_asset.filter_text.as_deref())),
        current_balance_cents: Set(new_asset.current_balance_cents),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = asset.insert(db).await?;
    debug!(asset_id = created.id, "Created asset");
    Ok(created)
}

/// Updates the balance of an existing asset by atomically adding a delta.
///
/// This performs a single database-level statement instead of read-modify-write:
/// `UPDATE assets SET current_balance_cents = current_balance_cents + delta WHERE id = ?`
/// Inside an open transaction the row stays locked until commit, so concurrent
/// postings to the same asset serialize.
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `asset_id` - ID of the asset to update
/// * `delta_cents` - Amount to add to the balance (negative for withdrawals)
pub async fn update_asset_balance_atomic<C>(
    db: &C,
    asset_id: i64,
    delta_cents: i64,
) -> Result<asset::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let updated = Asset::update_many()
        .col_expr(
            asset::Column::CurrentBalanceCents,
            Expr::col(asset::Column::CurrentBalanceCents).add(delta_cents),
        )
        .filter(asset::Column::Id.eq(asset_id))
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(Error::not_found("asset"));
    }

    Asset::find_by_id(asset_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("asset"))
}

/// Stores (or clears, when blank) the `filter_text` of an asset.
pub async fn set_filter_text<C>(db: &C, asset_id: i64, filter_text: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    Asset::update_many()
        .col_expr(
            asset::Column::FilterText,
            Expr::value(non_blank(Some(filter_text))),
        )
        .filter(asset::Column::Id.eq(asset_id))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn card(name: &str, number: Option<&str>) -> NewAsset {
        NewAsset {
            name: name.to_string(),
            asset_type: AssetType::Card,
            issuer: "삼성카드".to_string(),
            asset_number: number.map(str::to_string),
            filter_text: None,
            current_balance_cents: 0,
        }
    }

    #[tokio::test]
    async fn test_create_asset_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Blank name
        let result = create_asset(&db, 1, card("  ", Some("1234"))).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Card without number
        let result = create_asset(&db, 1, card("Card", None)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Blank number counts as missing
        let result = create_asset(&db, 1, card("Card", Some(" "))).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_cash_without_number() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let cash = create_asset(
            &db,
            group.id,
            NewAsset {
                name: " Wallet ".to_string(),
                asset_type: AssetType::Cash,
                issuer: "cash".to_string(),
                asset_number: None,
                filter_text: Some("  ".to_string()),
                current_balance_cents: 50_000,
            },
        )
        .await?;

        assert_eq!(cash.name, "Wallet");
        assert_eq!(cash.asset_number, None);
        assert_eq!(cash.filter_text, None);
        assert_eq!(cash.current_balance_cents, 50_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_balance_atomic() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let asset = create_test_asset(&db, group.id, "삼성카드", Some("1234")).await?;

        let updated = update_asset_balance_atomic(&db, asset.id, 15_000).await?;
        assert_eq!(updated.current_balance_cents, 15_000);

        let updated = update_asset_balance_atomic(&db, asset.id, -20_000).await?;
        assert_eq!(updated.current_balance_cents, -5_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_balance_missing_asset() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_asset_balance_atomic(&db, 999, 10).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_assets_are_group_scoped() -> Result<()> {
        let db = setup_test_db().await?;
        let home = create_test_group(&db, "home").await?;
        let other = create_test_group(&db, "other").await?;
        let mine = create_test_asset(&db, home.id, "삼성카드", Some("1234")).await?;
        let theirs = create_test_asset(&db, other.id, "삼성카드", Some("1234")).await?;

        let found = get_assets_for_groups(&db, &[home.id]).await?;
        assert_eq!(found, vec![mine.clone()]);
        assert!(get_assets_for_groups(&db, &[]).await?.is_empty());

        assert!(get_asset_in_group(&db, home.id, mine.id).await?.is_some());
        assert!(get_asset_in_group(&db, home.id, theirs.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_filter_text() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let asset = create_test_asset(&db, group.id, "국민카드", Some("1111")).await?;

        set_filter_text(&db, asset.id, " 스타벅스 ").await?;
        let stored = get_asset_in_group(&db, group.id, asset.id).await?.unwrap();
        assert_eq!(stored.filter_text.as_deref(), Some("스타벅스"));

        set_filter_text(&db, asset.id, "").await?;
        let stored = get_asset_in_group(&db, group.id, asset.id).await?.unwrap();
        assert_eq!(stored.filter_text, None);
        Ok(())
    }
}

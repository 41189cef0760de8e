//! Transaction business logic - Posting transactions against assets.
//!
//! Posting is the one place where an asset balance changes: the transaction row is
//! inserted and `current_balance_cents` is moved by the signed amount. Callers run it
//! inside a database transaction together with the WebSMS log write, so the three
//! writes commit or roll back as one unit.

use crate::{
    core::{asset::update_asset_balance_atomic, parser::Posting},
    entities::{Transaction, asset, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Placeholder rate stored for card/loan postings; the user corrects it later.
pub const PLACEHOLDER_INTEREST_RATE: f64 = 0.0;

/// Everything needed to post one transaction
#[derive(Debug, Clone)]
pub struct PostingRequest<'a> {
    /// Target asset; its group owns the transaction
    pub asset: &'a asset::Model,
    /// Acting user, when known
    pub user_id: Option<i64>,
    pub posting: Posting,
    pub memo: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// Originating WebSMS log entry
    pub websms_log_id: Option<i64>,
}

/// Inserts a transaction and applies its signed amount to the asset balance.
///
/// For card and loan assets the installment fields are filled: principal equals the
/// amount, installments default to 1 and the rate is [`PLACEHOLDER_INTEREST_RATE`].
///
/// Run this on an open database transaction; it does not begin or commit one itself.
#[instrument(skip(db, request), fields(asset_id = request.asset.id))]
pub async fn post_transaction<C>(db: &C, request: PostingRequest<'_>) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let PostingRequest {
        asset,
        user_id,
        posting,
        memo,
        occurred_at,
        websms_log_id,
    } = request;

    if posting.amount_cents < 0 {
        return Err(Error::validation("amount must not be negative"));
    }

    let (principal_cents, installment_count, interest_rate) =
        if asset.asset_type.tracks_installments() {
            (
                Some(posting.amount_cents),
                Some(posting.installments.unwrap_or(1)),
                Some(PLACEHOLDER_INTEREST_RATE),
            )
        } else {
            (None, None, None)
        };

    let transaction_model = transaction::ActiveModel {
        group_id: Set(asset.group_id),
        asset_id: Set(asset.id),
        user_id: Set(user_id),
        direction: Set(posting.direction),
        amount_cents: Set(posting.amount_cents),
        principal_cents: Set(principal_cents),
        installment_count: Set(installment_count),
        interest_rate: Set(interest_rate),
        memo: Set(memo),
        occurred_at: Set(occurred_at),
        websms_log_id: Set(websms_log_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = transaction_model.insert(db).await?;

    let delta = posting.direction.signed(posting.amount_cents);
    let updated = update_asset_balance_atomic(db, asset.id, delta).await?;

    info!(
        transaction_id = created.id,
        direction = ?created.direction,
        amount_cents = created.amount_cents,
        balance_cents = updated.current_balance_cents,
        "Posted transaction"
    );
    Ok(created)
}

/// Retrieves all transactions for an asset, newest first.
pub async fn get_transactions_for_asset<C>(
    db: &C,
    asset_id: i64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::AssetId.eq(asset_id))
        .order_by_desc(transaction::Column::OccurredAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every transaction posted from a WebSMS log entry.
pub async fn get_transactions_for_log<C>(db: &C, log_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::WebsmsLogId.eq(log_id))
        .all(db)
        .await
        .map_err(Into::into)
}

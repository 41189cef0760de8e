//! Unmatched review queue.
//!
//! Reviewers see the unmatched messages of their active group for one settlement
//! period, then either dismiss a message or resolve it against an asset. Resolving
//! re-parses the stored text with the deployment parser and posts through the same
//! routine ingestion uses, so a resolved row looks exactly like one processed on
//! arrival. Only `unmatched` rows can change; `processed` and `ignored` are final.

use crate::{
    core::{
        asset::{NewAsset, create_asset, get_asset_in_group, set_filter_text},
        parser::Parser,
        period::Period,
        transaction::{PostingRequest, post_transaction},
    },
    entities::{Group, LogStatus, WebSmsLog, asset, transaction, websms_log},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryOrder, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{info, instrument};

/// Most rows the unmatched queue returns
pub const UNMATCHED_LIMIT: u64 = 200;
/// Default page size of the admin log viewer
pub const LOG_LIMIT_DEFAULT: u64 = 200;
/// Largest page the admin log viewer may request
pub const LOG_LIMIT_MAX: u64 = 500;

/// Settlement period of `group_id`: the labelled month when `month` is given,
/// otherwise the period containing `today`.
pub async fn group_period<C>(
    db: &C,
    group_id: i64,
    month: Option<&str>,
    today: DateTime<Utc>,
) -> Result<Period>
where
    C: ConnectionTrait,
{
    let group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("group"))?;

    match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(label) => Period::from_label(label, group.month_start_day)
            .ok_or_else(|| Error::validation("month must be YYYY-MM")),
        None => Ok(Period::containing(group.month_start_day, today)),
    }
}

/// Unmatched rows of `group_id` received within `period`, newest first.
pub async fn list_unmatched<C>(
    db: &C,
    group_id: i64,
    period: &Period,
) -> Result<Vec<websms_log::Model>>
where
    C: ConnectionTrait,
{
    WebSmsLog::find()
        .filter(websms_log::Column::GroupId.eq(group_id))
        .filter(websms_log::Column::Status.eq(LogStatus::Unmatched))
        .filter(websms_log::Column::ReceivedAt.gte(period.start))
        .filter(websms_log::Column::ReceivedAt.lt(period.end))
        .order_by_desc(websms_log::Column::ReceivedAt)
        .order_by_desc(websms_log::Column::Id)
        .limit(UNMATCHED_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All rows of `group_id` within `period`, newest first, capped at
/// [`LOG_LIMIT_MAX`].
pub async fn list_logs<C>(
    db: &C,
    group_id: i64,
    period: &Period,
    limit: Option<u64>,
) -> Result<Vec<websms_log::Model>>
where
    C: ConnectionTrait,
{
    let limit = limit.unwrap_or(LOG_LIMIT_DEFAULT).clamp(1, LOG_LIMIT_MAX);
    WebSmsLog::find()
        .filter(websms_log::Column::GroupId.eq(group_id))
        .filter(websms_log::Column::ReceivedAt.gte(period.start))
        .filter(websms_log::Column::ReceivedAt.lt(period.end))
        .order_by_desc(websms_log::Column::ReceivedAt)
        .order_by_desc(websms_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks an unmatched row as ignored.
///
/// # Errors
/// `NotFound` when the row is missing, belongs to another group or is no longer
/// unmatched.
#[instrument(skip(db))]
pub async fn ignore<C>(db: &C, group_id: i64, log_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = WebSmsLog::update_many()
        .col_expr(websms_log::Column::Status, Expr::value(LogStatus::Ignored))
        .filter(websms_log::Column::Id.eq(log_id))
        .filter(websms_log::Column::GroupId.eq(group_id))
        .filter(websms_log::Column::Status.eq(LogStatus::Unmatched))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("log"));
    }
    info!(log_id, "WebSMS ignored");
    Ok(())
}

async fn find_unmatched(
    txn: &DatabaseTransaction,
    group_id: i64,
    log_id: i64,
) -> Result<websms_log::Model> {
    WebSmsLog::find_by_id(log_id)
        .filter(websms_log::Column::GroupId.eq(group_id))
        .filter(websms_log::Column::Status.eq(LogStatus::Unmatched))
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("log"))
}

/// Posts `log` against `asset` and flips the row to processed.
async fn post_log(
    txn: &DatabaseTransaction,
    parser: Parser,
    log: &websms_log::Model,
    asset: &asset::Model,
    user_id: Option<i64>,
) -> Result<transaction::Model> {
    let posting = parser
        .posting(&log.text)
        .ok_or(Error::UnableToParseAmount)?;

    let created = post_transaction(
        txn,
        PostingRequest {
            asset,
            user_id,
            posting,
            memo: Some(log.text_preview.clone()),
            occurred_at: log.received_at,
            websms_log_id: Some(log.id),
        },
    )
    .await?;

    let flipped = WebSmsLog::update_many()
        .col_expr(websms_log::Column::Status, Expr::value(LogStatus::Processed))
        .col_expr(websms_log::Column::AssetId, Expr::value(asset.id))
        .filter(websms_log::Column::Id.eq(log.id))
        .filter(websms_log::Column::Status.eq(LogStatus::Unmatched))
        .exec(txn)
        .await?;
    if flipped.rows_affected == 0 {
        return Err(Error::not_found("log"));
    }
    Ok(created)
}

fn given(filter_text: Option<&str>) -> Option<&str> {
    filter_text.filter(|text| !text.trim().is_empty())
}

/// Resolves an unmatched row against an existing asset of the same group.
///
/// When `filter_text` is given it is stored on the asset in the same transaction,
/// so future messages like this one match on arrival.
///
/// # Errors
/// `NotFound` for an unknown/foreign/final row or asset; `UnableToParseAmount` when
/// the stored text yields no amount. Nothing is written in either case.
#[instrument(skip(db, filter_text))]
pub async fn resolve<C>(
    db: &C,
    parser: Parser,
    group_id: i64,
    log_id: i64,
    asset_id: i64,
    user_id: Option<i64>,
    filter_text: Option<&str>,
) -> Result<transaction::Model>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    let log = find_unmatched(&txn, group_id, log_id).await?;
    let asset = get_asset_in_group(&txn, group_id, asset_id)
        .await?
        .ok_or_else(|| Error::not_found("asset"))?;

    let created = post_log(&txn, parser, &log, &asset, user_id).await?;
    if let Some(filter_text) = given(filter_text) {
        set_filter_text(&txn, asset.id, filter_text).await?;
    }
    txn.commit().await?;

    info!(log_id, asset_id, transaction_id = created.id, "WebSMS resolved");
    Ok(created)
}

/// Creates an asset from `new_asset` and resolves the row against it, atomically.
///
/// # Errors
/// As [`resolve`], plus `Validation` for an invalid asset.
#[instrument(skip(db, new_asset))]
pub async fn resolve_with_new_asset<C>(
    db: &C,
    parser: Parser,
    group_id: i64,
    log_id: i64,
    new_asset: NewAsset,
    user_id: Option<i64>,
) -> Result<(asset::Model, transaction::Model)>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    let log = find_unmatched(&txn, group_id, log_id).await?;
    if parser.posting(&log.text).is_none() {
        return Err(Error::UnableToParseAmount);
    }

    let asset = create_asset(&txn, group_id, new_asset).await?;
    let created = post_log(&txn, parser, &log, &asset, user_id).await?;
    let asset = get_asset_in_group(&txn, group_id, asset.id)
        .await?
        .ok_or_else(|| Error::not_found("asset"))?;
    txn.commit().await?;

    info!(
        log_id,
        asset_id = asset.id,
        transaction_id = created.id,
        "WebSMS resolved with new asset"
    );
    Ok((asset, created))
}

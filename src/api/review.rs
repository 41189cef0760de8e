//! Review queue endpoints, scoped to the session's active group.

use super::{
    AppState,
    extract::{JsonBody, SessionUser},
};
use crate::{
    core::{asset::NewAsset, review},
    entities::{AssetModel, TransactionModel, WebSmsLogModel},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// `YYYY-MM`; the current period when absent
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogList {
    /// Label of the period the items belong to
    pub period: String,
    pub items: Vec<WebSmsLogModel>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub asset_id: i64,
    #[serde(default)]
    pub filter_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Resolved {
    pub ok: bool,
    pub transaction: TransactionModel,
}

#[derive(Debug, Serialize)]
pub struct ResolvedWithAsset {
    pub ok: bool,
    pub asset: AssetModel,
    pub transaction: TransactionModel,
}

pub async fn list_unmatched(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<LogList>> {
    let group_id = session.require_group()?;
    let month = query.month.as_deref();
    let period = review::group_period(&*state.db, group_id, month, Utc::now()).await?;
    let items = review::list_unmatched(&*state.db, group_id, &period).await?;
    Ok(Json(LogList {
        period: period.label(),
        items,
    }))
}

pub async fn ignore(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(log_id): Path<i64>,
) -> Result<Json<Ack>> {
    let group_id = session.require_group()?;
    review::ignore(&*state.db, group_id, log_id).await?;
    Ok(Json(Ack { ok: true }))
}

pub async fn resolve(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(log_id): Path<i64>,
    JsonBody(body): JsonBody<ResolveRequest>,
) -> Result<Json<Resolved>> {
    let group_id = session.require_group()?;
    let transaction = review::resolve(
        &*state.db,
        state.parser,
        group_id,
        log_id,
        body.asset_id,
        Some(session.user_id),
        body.filter_text.as_deref(),
    )
    .await?;
    Ok(Json(Resolved {
        ok: true,
        transaction,
    }))
}

pub async fn resolve_new_asset(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(log_id): Path<i64>,
    JsonBody(new_asset): JsonBody<NewAsset>,
) -> Result<Json<ResolvedWithAsset>> {
    let group_id = session.require_group()?;
    let (asset, transaction) = review::resolve_with_new_asset(
        &*state.db,
        state.parser,
        group_id,
        log_id,
        new_asset,
        Some(session.user_id),
    )
    .await?;
    Ok(Json(ResolvedWithAsset {
        ok: true,
        asset,
        transaction,
    }))
}

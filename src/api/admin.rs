//! Admin endpoints: the WebSMS log viewer and group key management.

use super::{
    AppState,
    extract::{AdminUser, JsonBody},
    review::LogList,
};
use crate::{
    core::{
        credentials::{GroupKey, create_group_key, list_group_keys},
        review,
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub group_id: Option<i64>,
    pub month: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub group_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct KeyList {
    pub items: Vec<GroupKey>,
}

#[derive(Debug, Serialize)]
pub struct KeyCreated {
    pub item: GroupKey,
}

fn required_group(group_id: Option<i64>) -> Result<i64> {
    group_id
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::validation("group_id is required"))
}

pub async fn list_logs(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogList>> {
    let group_id = required_group(query.group_id)?;
    let month = query.month.as_deref();
    let period = review::group_period(&*state.db, group_id, month, Utc::now()).await?;
    let items = review::list_logs(&*state.db, group_id, &period, query.limit).await?;
    Ok(Json(LogList {
        period: period.label(),
        items,
    }))
}

pub async fn list_keys(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<KeyList>> {
    let items = list_group_keys(&*state.db).await?;
    Ok(Json(KeyList { items }))
}

pub async fn create_key(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    JsonBody(body): JsonBody<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyCreated>)> {
    let group_id = required_group(body.group_id)?;
    let item = create_group_key(&*state.db, group_id).await?;
    info!(admin = %admin.username, group_id, "Issued WebSMS API key");
    Ok((StatusCode::CREATED, Json(KeyCreated { item })))
}

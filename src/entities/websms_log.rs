//! WebSMS log entity - The persisted record of every inbound message.
//!
//! A row is created as `unmatched` or `processed`. Unmatched rows move to
//! `processed` (resolve) or `ignored` (ignore) exactly once; processed and
//! ignored rows are never modified again. `(group_id, received_at, text)` is
//! unique so a replayed message is not logged twice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    /// Awaiting human review
    #[sea_orm(string_value = "unmatched")]
    Unmatched,
    /// Posted as a transaction
    #[sea_orm(string_value = "processed")]
    Processed,
    /// Dismissed by a reviewer
    #[sea_orm(string_value = "ignored")]
    Ignored,
}

/// WebSMS log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "websms_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning group
    pub group_id: i64,
    /// Matched asset; always set once processed
    pub asset_id: Option<i64>,
    /// Ingestion instant
    pub received_at: DateTimeUtc,
    /// Raw message text as received
    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// Trimmed text, at most 120 characters
    pub text_preview: String,
    /// Character count of the raw text
    pub text_length: i32,
    pub status: LogStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

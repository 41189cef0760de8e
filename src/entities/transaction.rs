//! Transaction entity - Represents every posting against an asset.
//!
//! Each transaction has a `group_id`, `asset_id`, the acting `user_id` (when
//! known), a direction, a non-negative `amount_cents`, optional installment
//! fields for card and loan assets, a memo and `occurred_at`. Transactions
//! created from a WebSMS message point back to it through `websms_log_id`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which way money moves relative to the asset balance
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money in; balance increases
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Money out; balance decreases
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
}

impl Direction {
    /// Signed balance delta for an amount moving in this direction.
    #[must_use]
    pub const fn signed(self, amount_cents: i64) -> i64 {
        match self {
            Self::Deposit => amount_cents,
            Self::Withdraw => -amount_cents,
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning group
    pub group_id: i64,
    /// ID of the asset this transaction belongs to
    pub asset_id: i64,
    /// User who created the transaction, if one could be resolved
    pub user_id: Option<i64>,
    /// Deposit or withdraw
    pub direction: Direction,
    /// Amount in minor currency units, never negative
    pub amount_cents: i64,
    /// Principal for card/loan assets
    pub principal_cents: Option<i64>,
    /// Number of installments for card/loan assets
    pub installment_count: Option<i32>,
    /// Interest rate for card/loan assets; ingestion stores 0.0 as a placeholder
    pub interest_rate: Option<f64>,
    /// Free-text memo; for ingested messages the log preview
    pub memo: Option<String>,
    /// When the money moved
    pub occurred_at: DateTimeUtc,
    /// WebSMS log entry this transaction was posted from
    pub websms_log_id: Option<i64>,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one asset
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
    /// Optional originating WebSMS message
    #[sea_orm(
        belongs_to = "super::websms_log::Entity",
        from = "Column::WebsmsLogId",
        to = "super::websms_log::Column::Id"
    )]
    WebSmsLog,
    /// Acting user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::websms_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebSmsLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

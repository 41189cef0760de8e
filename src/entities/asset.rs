//! Asset entity - A tracked financial instrument with a running balance.
//!
//! Each asset belongs to one group and has a type (cash, account, card, loan),
//! an issuer, an optional card/account number and an optional `filter_text`
//! used for matching incoming WebSMS messages. `current_balance_cents` is only
//! ever changed by posting a transaction, never recomputed on read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of financial instrument
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Physical cash; the only type without an asset number
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank account
    #[sea_orm(string_value = "account")]
    Account,
    /// Credit or check card
    #[sea_orm(string_value = "card")]
    Card,
    /// Loan
    #[sea_orm(string_value = "loan")]
    Loan,
}

impl AssetType {
    /// Card and loan transactions carry principal, installment and rate fields.
    #[must_use]
    pub const fn tracks_installments(self) -> bool {
        matches!(self, Self::Card | Self::Loan)
    }

    /// Every type except cash needs an `asset_number`.
    #[must_use]
    pub const fn requires_number(self) -> bool {
        !matches!(self, Self::Cash)
    }
}

/// Asset database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    /// Unique identifier for the asset
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning group
    pub group_id: i64,
    /// Human-readable name (e.g., "Family card")
    pub name: String,
    /// Cash, account, card or loan
    pub asset_type: AssetType,
    /// Issuer as produced by the message parser (e.g., "삼성카드")
    pub issuer: String,
    /// Card suffix or account number; absent for cash
    pub asset_number: Option<String>,
    /// Comma-separated substrings that must all appear in a message
    pub filter_text: Option<String>,
    /// Running balance in minor currency units
    pub current_balance_cents: i64,
    /// When the asset was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Asset and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each asset belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// One asset has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

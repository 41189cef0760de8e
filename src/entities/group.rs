//! Group entity - A household that owns assets, transactions and WebSMS logs.
//!
//! Each group carries its own `month_start_day`, which defines the rolling
//! settlement period used by the review queue and the admin log viewer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique display name (e.g., "family")
    #[sea_orm(unique)]
    pub name: String,
    /// Day of month (1-28) on which a settlement period starts
    pub month_start_day: i32,
    /// When the group was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Group and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group owns many assets
    #[sea_orm(has_many = "super::asset::Entity")]
    Assets,
    /// One group owns many WebSMS log entries
    #[sea_orm(has_many = "super::websms_log::Entity")]
    WebSmsLogs,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::websms_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebSmsLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

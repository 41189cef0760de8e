//! User entity - A person who can review messages or submit them via a user key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user; admins may read every group's logs and manage keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access across groups
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Regular group member
    #[sea_orm(string_value = "user")]
    User,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Admin or regular user
    pub role: Role,
    /// Group the user currently works in, if one was chosen
    pub active_group_id: Option<i64>,
    /// When the user registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The currently active group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::ActiveGroupId",
        to = "super::group::Column::Id"
    )]
    ActiveGroup,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActiveGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! WebSMS API key entity - A key bound directly to one group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group-scoped API key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "websms_api_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group every message submitted with this key belongs to
    pub group_id: i64,
    /// The secret sent by the forwarding client
    #[sea_orm(unique)]
    pub api_key: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod asset;
pub mod group;
pub mod transaction;
pub mod user;
pub mod user_api_key;
pub mod user_group_access;
pub mod websms_api_key;
pub mod websms_log;

// Re-export specific types to avoid conflicts
pub use asset::{AssetType, Column as AssetColumn, Entity as Asset, Model as AssetModel};
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use transaction::{
    Column as TransactionColumn, Direction, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
pub use user_api_key::{Entity as UserApiKey, Model as UserApiKeyModel};
pub use user_group_access::{Entity as UserGroupAccess, Model as UserGroupAccessModel};
pub use websms_api_key::{Entity as WebSmsApiKey, Model as WebSmsApiKeyModel};
pub use websms_log::{
    Column as WebSmsLogColumn, Entity as WebSmsLog, LogStatus, Model as WebSmsLogModel,
};

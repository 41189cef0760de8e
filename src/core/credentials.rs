//! Credential resolution for submitters and reviewers.
//!
//! An API key maps either to a group (`websms_api_keys`) or to a user
//! (`user_api_keys`). User keys resolve to the user's active group, falling back to
//! the earliest access grant. Resolved identities are cached through an injected
//! [`KeyCache`].
//!
//! Reviewer sessions are established by the login service in front of this API,
//! which forwards the authenticated user id; [`load_session`] turns that id into a
//! role and active group.

use crate::{
    cache::KeyCache,
    entities::{
        Group, GroupColumn, Role, User, UserApiKey, UserGroupAccess, WebSmsApiKey, user,
        user_api_key, user_group_access, websms_api_key,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Who submitted a message and which groups' assets it may be matched against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    /// Group an unmatched message is logged under
    pub group_id: i64,
    /// Acting user, for user keys
    pub user_id: Option<i64>,
    /// Groups whose assets are matching candidates
    pub accessible_group_ids: Vec<i64>,
}

impl Submitter {
    /// Identity for a key bound directly to one group.
    #[must_use]
    pub fn for_group(group_id: i64) -> Self {
        Self {
            group_id,
            user_id: None,
            accessible_group_ids: vec![group_id],
        }
    }
}

/// Active and accessible groups of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGroups {
    /// Explicit active group, else the earliest grant
    pub active: Option<i64>,
    /// Every granted group plus the active one
    pub accessible: Vec<i64>,
}

/// Derives the active and accessible groups of `user`.
pub async fn user_groups<C>(db: &C, user: &user::Model) -> Result<UserGroups>
where
    C: ConnectionTrait,
{
    let grants = UserGroupAccess::find()
        .filter(user_group_access::Column::UserId.eq(user.id))
        .order_by_asc(user_group_access::Column::GrantedAt)
        .order_by_asc(user_group_access::Column::Id)
        .all(db)
        .await?;

    let active = user
        .active_group_id
        .or_else(|| grants.first().map(|grant| grant.group_id));

    let mut accessible: Vec<i64> = grants.iter().map(|grant| grant.group_id).collect();
    if let Some(active_id) = user.active_group_id {
        if !accessible.contains(&active_id) {
            accessible.push(active_id);
        }
    }

    Ok(UserGroups { active, accessible })
}

/// Resolves API keys to [`Submitter`]s.
pub struct CredentialResolver {
    cache: Arc<dyn KeyCache<Submitter>>,
    default_key: Option<String>,
    default_group: String,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("default_key", &self.default_key.as_ref().map(|_| "<set>"))
            .field("default_group", &self.default_group)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver {
    #[must_use]
    pub fn new(
        cache: Arc<dyn KeyCache<Submitter>>,
        default_key: Option<String>,
        default_group: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            default_key,
            default_group: default_group.into(),
        }
    }

    /// Resolves `api_key`; `Ok(None)` means the key is unknown.
    ///
    /// Lookup order: cache, group keys, user keys, then the configured default key.
    #[instrument(skip_all)]
    pub async fn resolve<C>(&self, db: &C, api_key: &str) -> Result<Option<Submitter>>
    where
        C: ConnectionTrait,
    {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Ok(None);
        }
        if let Some(cached) = self.cache.get(api_key).await {
            return Ok(Some(cached));
        }

        let mut submitter = lookup_group_key(db, api_key).await?;
        if submitter.is_none() {
            submitter = lookup_user_key(db, api_key).await?;
        }
        if submitter.is_none() {
            submitter = self.bind_default_key(db, api_key).await?;
        }

        if let Some(resolved) = &submitter {
            debug!(group_id = resolved.group_id, user_id = ?resolved.user_id, "Resolved API key");
            self.cache.put(api_key.to_string(), resolved.clone()).await;
        }
        Ok(submitter)
    }

    async fn bind_default_key<C>(&self, db: &C, api_key: &str) -> Result<Option<Submitter>>
    where
        C: ConnectionTrait,
    {
        if self.default_key.as_deref() != Some(api_key) {
            return Ok(None);
        }
        let Some(group) = Group::find()
            .filter(GroupColumn::Name.eq(self.default_group.as_str()))
            .one(db)
            .await?
        else {
            warn!(group = %self.default_group, "Default API key used but its group does not exist");
            return Ok(None);
        };

        let key = websms_api_key::ActiveModel {
            group_id: Set(group.id),
            api_key: Set(api_key.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        WebSmsApiKey::insert(key)
            .on_conflict(
                OnConflict::column(websms_api_key::Column::ApiKey)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;

        info!(group_id = group.id, "Bound default WebSMS API key");
        Ok(Some(Submitter::for_group(group.id)))
    }
}

async fn lookup_group_key<C>(db: &C, api_key: &str) -> Result<Option<Submitter>>
where
    C: ConnectionTrait,
{
    let key = WebSmsApiKey::find()
        .filter(websms_api_key::Column::ApiKey.eq(api_key))
        .one(db)
        .await?;
    Ok(key.map(|key| Submitter::for_group(key.group_id)))
}

async fn lookup_user_key<C>(db: &C, api_key: &str) -> Result<Option<Submitter>>
where
    C: ConnectionTrait,
{
    let Some(key) = UserApiKey::find()
        .filter(user_api_key::Column::ApiKey.eq(api_key))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let Some(user) = User::find_by_id(key.user_id).one(db).await? else {
        return Ok(None);
    };

    let groups = user_groups(db, &user).await?;
    let Some(group_id) = groups.active else {
        warn!(user_id = user.id, "User API key has no group to log into");
        return Ok(None);
    };
    Ok(Some(Submitter {
        group_id,
        user_id: Some(user.id),
        accessible_group_ids: groups.accessible,
    }))
}

/// Authenticated reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// Group the review queue is scoped to
    pub group_id: Option<i64>,
}

impl Session {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The active group, or `Forbidden` when the user has none.
    pub fn require_group(&self) -> Result<i64> {
        self.group_id.ok_or_else(|| Error::Forbidden {
            message: "no active group".to_string(),
        })
    }
}

/// Loads the session for an authenticated user id; `None` for unknown users.
pub async fn load_session<C>(db: &C, user_id: i64) -> Result<Option<Session>>
where
    C: ConnectionTrait,
{
    let Some(user) = User::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };
    let groups = user_groups(db, &user).await?;
    Ok(Some(Session {
        user_id: user.id,
        username: user.username,
        role: user.role,
        group_id: groups.active,
    }))
}

/// Group key as shown to administrators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupKey {
    pub id: i64,
    pub group_id: i64,
    pub group_name: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

/// Lists every group key, ordered by group name then newest first.
pub async fn list_group_keys<C>(db: &C) -> Result<Vec<GroupKey>>
where
    C: ConnectionTrait,
{
    let rows = WebSmsApiKey::find()
        .find_also_related(Group)
        .all(db)
        .await?;

    let mut keys: Vec<GroupKey> = rows
        .into_iter()
        .filter_map(|(key, group)| {
            group.map(|group| GroupKey {
                id: key.id,
                group_id: key.group_id,
                group_name: group.name,
                api_key: key.api_key,
                created_at: key.created_at,
            })
        })
        .collect();
    keys.sort_by(|a, b| {
        a.group_name
            .cmp(&b.group_name)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(keys)
}

/// Generates a new random key for `group_id`.
#[instrument(skip(db))]
pub async fn create_group_key<C>(db: &C, group_id: i64) -> Result<GroupKey>
where
    C: ConnectionTrait,
{
    let group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("group"))?;

    let key = websms_api_key::ActiveModel {
        group_id: Set(group.id),
        api_key: Set(Uuid::new_v4().simple().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(key_id = key.id, group_id, "Created WebSMS API key");
    Ok(GroupKey {
        id: key.id,
        group_id: key.group_id,
        group_name: group.name,
        api_key: key.api_key,
        created_at: key.created_at,
    })
}

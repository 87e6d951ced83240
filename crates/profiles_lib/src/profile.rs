//! The profile read service.
//!
//! The profile views never contain the email of a user. The stats are only computed when
//! requested, because they require aggregating all the maps of the user.

use entity::users;
use sea_orm::{ConnectionTrait, EntityTrait as _, TransactionTrait};
use serde::Serialize;

use crate::{
    error::ProfilesResult,
    link, must,
    stats::{self, UserStats},
};

/// The profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    /// The user ID.
    pub id: i32,
    /// The display name.
    pub name: String,
    /// The identity hash the account is linked to.
    pub hash: Option<String>,
    /// Whether the user has elevated privileges.
    ///
    /// This is only provided to the user themselves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    /// The URL to the avatar.
    pub avatar: String,
    /// The stats of the user, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UserStats>,
}

/// Returns the URL to the avatar of the user, or a generated one if they don't have any.
pub fn avatar_url(user: &users::Model) -> String {
    match &user.avatar {
        Some(avatar) => avatar.clone(),
        None => format!(
            "https://www.gravatar.com/avatar/{}?d=retro",
            user.hash.as_deref().unwrap_or_default()
        ),
    }
}

impl UserDetail {
    /// Returns the public profile of the provided user.
    pub fn from_user(user: users::Model) -> Self {
        Self {
            avatar: avatar_url(&user),
            id: user.id,
            name: user.name,
            hash: user.hash,
            admin: None,
            stats: None,
        }
    }

    /// Returns the profile of the provided user, as seen by themselves.
    pub fn from_self(user: users::Model) -> Self {
        let admin = user.admin;
        Self {
            admin: Some(admin),
            ..Self::from_user(user)
        }
    }

    /// Attaches the provided stats to the profile.
    pub fn with_stats(self, stats: UserStats) -> Self {
        Self {
            stats: Some(stats),
            ..self
        }
    }
}

/// Returns the profile of the authenticated user.
///
/// The user must exist in the database.
pub async fn get_self<C: ConnectionTrait>(conn: &C, user_id: i32) -> ProfilesResult<UserDetail> {
    let user = must::have_user(conn, user_id).await?;
    Ok(UserDetail::from_self(user))
}

/// Returns the public profile of the user with the provided ID, with their stats if requested.
pub async fn get_by_id<C>(
    conn: &C,
    user_id: i32,
    with_stats: bool,
) -> ProfilesResult<Option<UserDetail>>
where
    C: ConnectionTrait + TransactionTrait,
{
    let Some(user) = users::Entity::find_by_id(user_id).one(conn).await? else {
        return Ok(None);
    };

    let detail = UserDetail::from_user(user);

    if with_stats {
        let stats = stats::compute(conn, user_id).await?;
        Ok(Some(detail.with_stats(stats)))
    } else {
        Ok(Some(detail))
    }
}

/// Returns the public profile of the user linked to the provided identity hash.
pub async fn get_by_hash<C: ConnectionTrait>(
    conn: &C,
    hash: &str,
) -> ProfilesResult<Option<UserDetail>> {
    let user = link::lookup_by_hash(conn, hash).await?;
    Ok(user.map(UserDetail::from_user))
}

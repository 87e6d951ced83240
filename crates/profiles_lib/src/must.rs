//! This module contains utility functions used to retrieve some objects from the database,
//! that must exist. This is why it is called `must`.
//!
//! When such an object doesn't exist, the returned value isn't `Option::None` but the
//! corresponding error (for example, `ProfilesError::UserNotFound`). This is used by the routes
//! that require an authenticated user, whose account must already be registered.

use entity::users;
use sea_orm::{ConnectionTrait, EntityTrait as _};

use crate::error::{ProfilesError, ProfilesResult};

/// Returns the user in the database bound to the provided ID.
pub async fn have_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> ProfilesResult<users::Model> {
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(ProfilesError::UserNotFound(user_id))
}

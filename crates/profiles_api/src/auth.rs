//! The authentication of the users, through their session.
//!
//! The session cookie is set by the login service of the platform, which shares the session key
//! with this API. The API only reads the session, and updates it when the user links their account.

use actix_session::Session;
use profiles_lib::{internal, session::UserSession};

use crate::{ApiErrorKind, ApiResult};

/// The key of the user state in the session.
pub const SESSION_KEY: &str = "__profiles_session";

/// Returns the state of the authenticated user.
///
/// This fails with an [`ApiErrorKind::Unauthorized`] error if the session is empty. It must be
/// called before any access to the database.
pub fn require_user(session: &Session) -> ApiResult<UserSession> {
    session
        .get::<UserSession>(SESSION_KEY)
        .map_err(|err| internal!("unable to read session user: {err}"))?
        .ok_or(ApiErrorKind::Unauthorized)
}

/// Saves the state of the authenticated user in its session.
pub fn store_user(session: &Session, user: &UserSession) -> ApiResult<()> {
    session
        .insert(SESSION_KEY, user)
        .map_err(|err| internal!("unable to insert session user: {err}"))?;
    Ok(())
}

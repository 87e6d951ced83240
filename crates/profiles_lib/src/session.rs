//! The information kept in the session of an authenticated user.

use serde::{Deserialize, Serialize};

/// Represents the state stored in the session of an authenticated user.
///
/// The account linking procedure updates the `hash` field on every successful link, so that the
/// next requests of the session see the new state without querying the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// The ID of the authenticated user.
    pub user_id: i32,
    /// The external identity hash the user is linked to, if any.
    pub hash: Option<String>,
}

impl UserSession {
    /// Returns the session of a user who hasn't linked their account yet.
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            hash: None,
        }
    }
}

//! A module containing the [`ProfilesError`] struct, which contains various basic error types.

use sea_orm::TransactionError;

/// Represents any type of error that could happen when using this crate.
#[derive(thiserror::Error, Debug)]
#[rustfmt::skip]
pub enum ProfilesError {
    // --------
    // --- Internal server errors
    // --------

    /// An error from the database.
    #[error(transparent)]
    DbError(#[from] sea_orm::DbErr),
    /// An error that happened when sending a request to the verification provider.
    #[error(transparent)]
    ExternalRequest(#[from] reqwest::Error),
    /// An internal error.
    #[error("internal error: {0}")]
    Internal(String),

    // --------
    // --- Logical errors
    // --------

    /// The user with the provided ID was not found.
    #[error("user with id `{0}` not found in database")]
    UserNotFound(
        /// The user ID.
        i32,
    ),
    /// The identity hash is held by another account that can't be dispossessed of it.
    ///
    /// This is only raised inside the link transaction to roll it back, and is turned into
    /// an unsuccessful link for the caller.
    #[error("identity hash is already linked to another account")]
    HashAlreadyLinked,
}

/// Shortcut for creating an internal error, by formatting a message.
///
/// See [`ProfilesError::Internal`].
#[macro_export]
macro_rules! internal {
    ($($t:tt)*) => {{
        $crate::error::ProfilesError::Internal($crate::error::__private::format!($($t)*))
    }};
}

#[doc(hidden)]
pub mod __private {
    pub use std::format;
}

impl<E> From<TransactionError<E>> for ProfilesError
where
    ProfilesError: From<E>,
{
    fn from(value: TransactionError<E>) -> Self {
        match value {
            TransactionError::Connection(db_err) => From::from(db_err),
            TransactionError::Transaction(e) => From::from(e),
        }
    }
}

/// Represents the result of a computation that could return a [`ProfilesError`].
pub type ProfilesResult<T = ()> = Result<T, ProfilesError>;

//! The account linking engine.
//!
//! It reconciles a local account with an externally verified identity hash. When the hash is
//! already held by another account without email, that account is dispossessed of it and all
//! its maps are transferred to the requesting user, in the same transaction.
//!
//! The procedure is split in three steps:
//!
//! 1. [`resolve_candidates`]: the string provided by the user is turned into a set of
//!    candidate hashes. It is either a raw hash, or the name of an account.
//! 2. [`LinkEngine::verify`]: the verification gateway tells which candidate corresponds to the
//!    identity of the user. This happens outside of any transaction.
//! 3. [`apply_link`]: the match is applied to the database, in a single transaction.

use entity::{maps, users};
use sea_orm::{
    ColumnTrait as _, Condition, ConnectionTrait, EntityTrait as _, QueryFilter as _,
    QuerySelect as _, SqlErr, TransactionTrait, prelude::Expr,
};
use serde::Serialize;

use crate::{
    error::{ProfilesError, ProfilesResult},
    session::UserSession,
    sync,
    verify::UserVerifyProvider,
};

/// The length of a raw identity hash.
pub const HASH_LEN: usize = 24;

/// Returns true if the provided string has the shape of a raw identity hash.
///
/// Any other string is considered as the name of an account.
pub fn looks_like_hash(s: &str) -> bool {
    s.chars().count() == HASH_LEN && s.starts_with('5')
}

/// The result of a link request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkResult {
    /// The hash the account is linked to, or the identity hash of the user known by
    /// the verification gateway if the link failed.
    pub hash: Option<String>,
    /// Whether the account is linked.
    pub linked: bool,
}

impl LinkResult {
    fn linked(hash: String) -> Self {
        Self {
            hash: Some(hash),
            linked: true,
        }
    }

    fn unlinked(hash: Option<String>) -> Self {
        Self {
            hash,
            linked: false,
        }
    }
}

/// Returns the candidate hashes designated by the string provided by the user.
///
/// If the string looks like a raw hash, it is the only candidate. Otherwise, it is treated as
/// a name, and the candidates are the hashes of all the linked accounts having that name.
pub async fn resolve_candidates<C: ConnectionTrait>(
    conn: &C,
    requested: Option<&str>,
) -> ProfilesResult<Vec<String>> {
    let Some(requested) = requested else {
        return Ok(Vec::new());
    };

    if looks_like_hash(requested) {
        return Ok(vec![requested.to_owned()]);
    }

    let hashes: Vec<Option<String>> = users::Entity::find()
        .select_only()
        .column(users::Column::Hash)
        .filter(
            users::Column::Name
                .eq(requested)
                .and(users::Column::Hash.is_not_null()),
        )
        .into_tuple()
        .all(conn)
        .await?;

    let hashes: Vec<_> = hashes.into_iter().flatten().collect();
    tracing::debug!(
        "`{requested}` treated as a name, found {} candidate(s)",
        hashes.len()
    );

    Ok(hashes)
}

/// Returns the user holding the provided identity hash.
pub async fn lookup_by_hash<C: ConnectionTrait>(
    conn: &C,
    hash: &str,
) -> ProfilesResult<Option<users::Model>> {
    let user = users::Entity::find()
        .filter(users::Column::Hash.eq(hash))
        .one(conn)
        .await?;
    Ok(user)
}

/// Returns the condition matching the account that can be dispossessed of the hash.
fn vacatable(user_id: i32, hash: &str) -> Condition {
    Condition::all()
        .add(users::Column::Hash.eq(hash))
        .add(users::Column::Email.is_null())
        .add(users::Column::Id.ne(user_id))
}

/// Clears the hash of the account holding it, if that account has no email.
///
/// The check and the clear are made atomically: either with a single conditional update
/// returning the affected row, or with an exclusive lock on the row before updating it,
/// for the backends that don't support `RETURNING`.
///
/// Returns the ID of the dispossessed account.
async fn vacate_hash<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    hash: &str,
) -> ProfilesResult<Option<i32>> {
    if conn.support_returning() {
        vacate_hash_returning(conn, user_id, hash).await
    } else {
        vacate_hash_locked(conn, user_id, hash).await
    }
}

async fn vacate_hash_returning<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    hash: &str,
) -> ProfilesResult<Option<i32>> {
    let previous = users::Entity::update_many()
        .col_expr(users::Column::Hash, Expr::value(Option::<String>::None))
        .filter(vacatable(user_id, hash))
        .exec_with_returning(conn)
        .await?;
    Ok(previous.first().map(|user| user.id))
}

async fn vacate_hash_locked<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    hash: &str,
) -> ProfilesResult<Option<i32>> {
    let locked: Option<i32> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .filter(vacatable(user_id, hash))
        .lock_exclusive()
        .into_tuple()
        .one(conn)
        .await?;

    let Some(previous_id) = locked else {
        return Ok(None);
    };

    let res = users::Entity::update_many()
        .col_expr(users::Column::Hash, Expr::value(Option::<String>::None))
        .filter(vacatable(user_id, hash).add(users::Column::Id.eq(previous_id)))
        .exec(conn)
        .await?;

    Ok((res.rows_affected > 0).then_some(previous_id))
}

/// Transfers the ownership of every map of a user to another one.
///
/// Returns the amount of transferred maps.
async fn transfer_maps<C: ConnectionTrait>(conn: &C, from: i32, to: i32) -> ProfilesResult<u64> {
    let res = maps::Entity::update_many()
        .col_expr(maps::Column::Uploader, Expr::value(to))
        .filter(maps::Column::Uploader.eq(from))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

async fn is_hash_held_by_other<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    hash: &str,
) -> ProfilesResult<bool> {
    let holder: Option<i32> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .filter(
            users::Column::Hash
                .eq(hash)
                .and(users::Column::Id.ne(user_id)),
        )
        .into_tuple()
        .one(conn)
        .await?;
    Ok(holder.is_some())
}

async fn assign_hash<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    hash: &str,
) -> ProfilesResult<()> {
    let res = users::Entity::update_many()
        .col_expr(users::Column::Hash, Expr::value(hash))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await;

    match res {
        Ok(_) => Ok(()),
        // A concurrent link attempt assigned the hash after we checked it
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(ProfilesError::HashAlreadyLinked)
        }
        Err(e) => Err(e.into()),
    }
}

/// Applies the result of the verification to the account of the user, in a single transaction.
///
/// ## Parameters
///
/// * `user_id`: the ID of the requesting user.
/// * `matched`: the candidate hash confirmed by the verification gateway, if any.
/// * `user_hash`: the identity hash of the user known by the gateway. It is only returned
///   as an information if the link fails, and never saved.
///
/// If the account is already linked, its current hash is returned and `matched` is ignored.
/// This makes the procedure idempotent, and tolerant to a concurrent request linking the
/// account first.
///
/// If the link fails because another account can't be dispossessed of the hash, nothing is
/// modified and the link is reported as unsuccessful.
pub async fn apply_link<C: TransactionTrait>(
    conn: &C,
    user_id: i32,
    matched: Option<&str>,
    user_hash: Option<String>,
) -> ProfilesResult<LinkResult> {
    let res: ProfilesResult<LinkResult> = sync::read_committed(conn, async |txn| {
        let current: Option<Option<String>> = users::Entity::find_by_id(user_id)
            .select_only()
            .column(users::Column::Hash)
            .into_tuple()
            .one(txn)
            .await?;

        match current {
            None => return Err(ProfilesError::UserNotFound(user_id)),
            Some(Some(hash)) => return Ok(LinkResult::linked(hash)),
            Some(None) => (),
        }

        let Some(matched) = matched else {
            return Ok(LinkResult::unlinked(user_hash.clone()));
        };

        if let Some(previous_id) = vacate_hash(txn, user_id, matched).await? {
            let transferred = transfer_maps(txn, previous_id, user_id).await?;
            tracing::info!(
                "User {previous_id} dispossessed of its hash by user {user_id}, \
                {transferred} map(s) transferred"
            );
        } else if is_hash_held_by_other(txn, user_id, matched).await? {
            return Err(ProfilesError::HashAlreadyLinked);
        }

        assign_hash(txn, user_id, matched).await?;
        tracing::info!("User {user_id} linked to its identity hash");

        Ok(LinkResult::linked(matched.to_owned()))
    })
    .await;

    match res {
        Err(ProfilesError::HashAlreadyLinked) => {
            tracing::info!("Identity hash of user {user_id} is held by another account");
            Ok(LinkResult::unlinked(user_hash))
        }
        other => other,
    }
}

/// The account linking engine, with its verification gateway.
#[derive(Debug, Clone, Default)]
pub struct LinkEngine<V> {
    verifier: V,
}

impl<V: UserVerifyProvider> LinkEngine<V> {
    /// Creates a new engine using the provided verification gateway.
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Returns the single candidate confirmed by the gateway to correspond to the
    /// `expected` identity.
    pub async fn verify(
        &self,
        candidates: &[String],
        expected: Option<&str>,
    ) -> ProfilesResult<Option<String>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let matched = self
            .verifier
            .validate_user(candidates, expected)
            .await
            .inspect_err(|e| tracing::warn!("Verification gateway failed: {e}"))?;

        // Only a provided candidate can be linked
        Ok(matched.filter(|hash| candidates.contains(hash)))
    }

    /// Returns the identity hash of the session user known by the gateway, and whether
    /// the session is already linked.
    ///
    /// This doesn't touch the database.
    pub async fn link_status(&self, session: &UserSession) -> ProfilesResult<LinkResult> {
        let hash = self.verifier.get_hash(session.user_id).await?;
        Ok(LinkResult {
            hash,
            linked: session.hash.is_some(),
        })
    }

    /// Links the account of the session user with the identity designated by `requested`.
    ///
    /// On success, the hash of the session is updated.
    pub async fn link<C>(
        &self,
        conn: &C,
        session: &mut UserSession,
        requested: Option<&str>,
    ) -> ProfilesResult<LinkResult>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let user_hash = self.verifier.get_hash(session.user_id).await?;
        let candidates = resolve_candidates(conn, requested).await?;
        let matched = self.verify(&candidates, user_hash.as_deref()).await?;

        let res = apply_link(conn, session.user_id, matched.as_deref(), user_hash).await?;

        if res.linked {
            session.hash = res.hash.clone();
        }

        Ok(res)
    }
}

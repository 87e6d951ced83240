//! Helpers to run a closure inside an SQL transaction.
//!
//! The transaction is committed if the closure returns `Ok`, and rolled back otherwise, so a
//! failing step never leaves the previous steps applied.

use sea_orm::{AccessMode, DatabaseTransaction, DbErr, IsolationLevel, TransactionTrait};

/// Wraps the call of the provided function with an SQL transaction with the provided mode.
///
/// ## Arguments
///
/// * `conn`: the connection to the database, which is forwarded to the provided function
///   as a transaction.
/// * `isolation_level`: the SQL isolation level.
/// * `access_mode`: the SQL access mode.
/// * `f`: the function itself.
///
/// Backends that don't support configuring the transaction (SQLite) ignore the isolation level
/// and the access mode. Their transactions are serializable anyway.
pub async fn transaction_with_config<F, C, T, E>(
    conn: &C,
    isolation_level: Option<IsolationLevel>,
    access_mode: Option<AccessMode>,
    f: F,
) -> Result<T, E>
where
    F: for<'a> AsyncFnOnce(&'a DatabaseTransaction) -> Result<T, E>,
    E: From<DbErr>,
    C: TransactionTrait,
{
    let txn = conn.begin_with_config(isolation_level, access_mode).await?;

    match f(&txn).await {
        Ok(ret) => {
            txn.commit().await?;
            Ok(ret)
        }
        Err(e) => {
            txn.rollback().await?;
            Err(e)
        }
    }
}

/// Wraps the call of the provided function with a read-write SQL transaction, with the
/// `READ COMMITTED` isolation level.
///
/// This is the minimum level required by the account linking procedure: every statement
/// sees the rows committed by the concurrent link attempts before it started.
pub async fn read_committed<F, C, T, E>(conn: &C, f: F) -> Result<T, E>
where
    F: for<'a> AsyncFnOnce(&'a DatabaseTransaction) -> Result<T, E>,
    E: From<DbErr>,
    C: TransactionTrait,
{
    transaction_with_config(
        conn,
        Some(IsolationLevel::ReadCommitted),
        Some(AccessMode::ReadWrite),
        f,
    )
    .await
}

/// Wraps the call of the provided function with a read-only SQL transaction.
///
/// This is used to get a consistent view of the database over several aggregate queries.
pub async fn read_only<F, C, T, E>(conn: &C, f: F) -> Result<T, E>
where
    F: for<'a> AsyncFnOnce(&'a DatabaseTransaction) -> Result<T, E>,
    E: From<DbErr>,
    C: TransactionTrait,
{
    transaction_with_config(conn, None, Some(AccessMode::ReadOnly), f).await
}

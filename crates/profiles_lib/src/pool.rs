//! Contains types to represent database pools.

use sea_orm::{ConnectOptions, DbConn};

/// Represents the database of the service.
pub struct Database {
    /// The SQL database connection pool.
    pub sql_conn: DbConn,
}

impl Database {
    /// Returns the database from the URL to the SQL database.
    pub async fn from_db_url(db_url: String) -> Result<Self, sea_orm::DbErr> {
        let sql_conn = sea_orm::Database::connect(db_url).await?;
        Ok(Self { sql_conn })
    }

    /// Returns the database from custom connection options.
    ///
    /// This is used for testing, to limit the pool of an in-memory database to a single
    /// connection.
    pub async fn from_options(options: ConnectOptions) -> Result<Self, sea_orm::DbErr> {
        let sql_conn = sea_orm::Database::connect(options).await?;
        Ok(Self { sql_conn })
    }
}

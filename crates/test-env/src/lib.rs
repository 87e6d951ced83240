use anyhow::Context as _;
use migration::MigratorTrait as _;
use profiles_lib::Database;
use rand::Rng as _;
use sea_orm::ConnectOptions;
use tracing_subscriber::fmt::TestWriter;

/// Returns a random identity hash, with the shape of a real one.
pub fn gen_hash() -> String {
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(23)
        .map(char::from)
        .collect();
    format!("5{suffix}")
}

pub trait IntoResult {
    type Out;

    fn into_result(self) -> anyhow::Result<Self::Out>;
}

impl IntoResult for () {
    type Out = ();

    fn into_result(self) -> anyhow::Result<Self::Out> {
        Ok(())
    }
}

impl<T, E> IntoResult for Result<T, E>
where
    anyhow::Error: From<E>,
{
    type Out = T;

    fn into_result(self) -> anyhow::Result<Self::Out> {
        self.map_err(From::from)
    }
}

pub fn init_env() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => return Err(err).context("cannot retrieve .env files"),
        _ => (),
    }

    let _ = tracing_subscriber::fmt()
        .with_writer(TestWriter::new())
        .try_init();

    Ok(())
}

/// Returns a fresh migrated database, living in memory.
pub async fn get_db() -> anyhow::Result<Database> {
    // An in-memory SQLite database only lives as long as its connection, so the pool
    // must keep exactly one.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::from_options(options)
        .await
        .context("cannot create in-memory database")?;
    migration::Migrator::up(&db.sql_conn, None).await?;
    tracing::debug!("Created in-memory test database");

    Ok(db)
}

pub async fn wrap<F, R>(test: F) -> anyhow::Result<<R as IntoResult>::Out>
where
    F: AsyncFnOnce(Database) -> R,
    R: IntoResult,
{
    init_env()?;
    let db = get_db().await?;
    test(db).await.into_result()
}

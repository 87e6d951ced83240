//! The user profile API program.
//!
//! The program also includes a [library](profiles_api_lib). Overall, it uses the [`profiles_lib`]
//! crate as a main dependency.

use actix_cors::Cors;
use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::{
    App, HttpServer,
    cookie::{Key, time::Duration as CookieDuration},
    web::Data,
};
use anyhow::Context;
use migration::MigratorTrait;
use mkenv::prelude::*;
use profiles_api_lib::configure::{self, CustomRootSpanBuilder};
use profiles_lib::{Database, link::LinkEngine, verify::Verifier};
use tracing::level_filters::LevelFilter;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

fn session_key(raw: &str) -> anyhow::Result<Key> {
    #[cfg(debug_assertions)]
    if raw.is_empty() {
        tracing::warn!("No session key provided, sessions won't survive a restart");
        return Ok(Key::generate());
    }

    Key::try_from(raw.as_bytes()).context("The session key must be at least 64 bytes long")
}

/// The main entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => return Err(err).context("cannot retrieve .env files"),
        _ => (),
    }

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let env = profiles_api_lib::init_env()?;

    let db = Database::from_db_url(env.db_env.db_url.db_url.get()).await?;
    migration::Migrator::up(&db.sql_conn, None).await?;
    let db = Data::new(db);

    let lib_env = profiles_lib::env();
    let verifier = Verifier::from_url(
        lib_env.verify_provider_url.get(),
        lib_env.verify_provider_timeout.get(),
    )?;
    let engine = Data::new(LinkEngine::new(verifier));

    let sess_key = session_key(&env.dynamic.sess_key.get())?;
    let session_ttl = CookieDuration::seconds(env.session_ttl.get() as i64);
    let port = env.port.get();

    HttpServer::new(move || {
        let cors = Cors::default()
            .supports_credentials()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["accept", "content-type"])
            .max_age(3600);
        #[cfg(debug_assertions)]
        let cors = cors.allow_any_origin();
        #[cfg(not(debug_assertions))]
        let cors = cors.allowed_origin(&env.host.host.get());

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::<CustomRootSpanBuilder>::new())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), sess_key.clone())
                    .cookie_secure(cfg!(not(debug_assertions)))
                    .cookie_content_security(CookieContentSecurity::Private)
                    .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                    .build(),
            )
            .configure(|cfg| configure::configure(cfg, db.clone(), engine.clone()))
    })
    .bind(("0.0.0.0", port))
    .context("Cannot bind 0.0.0.0 address")?
    .run()
    .await
    .context("Cannot create actix-web server")?;

    Ok(())
}

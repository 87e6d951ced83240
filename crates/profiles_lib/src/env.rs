use std::time::Duration;

use once_cell::sync::OnceCell;

#[cfg(debug_assertions)]
mkenv::make_config! {
    /// The environment used to set up a connection to the SQL database.
    pub struct DbUrlEnv {
        /// The database URL.
        pub db_url: {
            var_name: "DATABASE_URL",
            description: "The URL to the SQL database",
        }
    }
}
#[cfg(not(debug_assertions))]
mkenv::make_config! {
    /// The environment used to set up a connection to the SQL database.
    pub struct DbUrlEnv {
        /// The path to the file containing the database URL.
        pub db_url: {
            var_name: "DATABASE_URL",
            layers: [
                file_read(),
            ],
            description: "The path to the file containing the URL to the SQL database",
        }
    }
}

mkenv::make_config! {
    /// The environment used to set up a connection to the databases of the service.
    pub struct DbEnv {
        /// The environment for the SQL database.
        pub db_url: { DbUrlEnv },
    }
}

mkenv::make_config! {
    /// The environment used by this crate.
    pub struct LibEnv {
        /// The base URL of the identity verification provider.
        pub verify_provider_url: {
            var_name: "VERIFY_PROVIDER_URL",
            layers: [or_default()],
            description: "The base URL of the identity verification provider. When empty, \
                no account can be verified",
            default_val_fmt: "empty",
        },

        /// The timeout of a request sent to the identity verification provider.
        pub verify_provider_timeout: {
            var_name: "VERIFY_PROVIDER_TIMEOUT_SECONDS",
            layers: [
                parsed<Duration>(|input| {
                    input.parse().map(Duration::from_secs).map_err(From::from)
                }),
                or_default_val(|| Duration::from_secs(10)),
            ],
            description: "The timeout of a request sent to the identity verification provider, \
                in seconds",
            default_val_fmt: "10s",
        },
    }
}

static ENV: OnceCell<LibEnv> = OnceCell::new();

/// Initializes the provided library environment as global.
///
/// If this function has already been called, the provided environment will be ignored.
pub fn init_env(env: LibEnv) {
    let _ = ENV.set(env);
}

/// Returns a static reference to the global library environment.
///
/// **Caution**: To use this function, the [`init_env()`] function must have been called at the start
/// of the program.
pub fn env() -> &'static LibEnv {
    ENV.get().unwrap()
}

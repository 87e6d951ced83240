use mkenv::{error::ConfigInitError, prelude::*};
use once_cell::sync::OnceCell;
use profiles_lib::{DbEnv, LibEnv};

#[cfg(not(debug_assertions))]
mkenv::make_config! {
    pub struct DynamicApiEnv {
        pub sess_key: {
            var_name: "PROFILES_API_SESSION_KEY_FILE",
            layers: [file_read()],
            description: "The path to the file containing the session key used by the API",
        },
    }
}

#[cfg(debug_assertions)]
mkenv::make_config! {
    pub struct DynamicApiEnv {
        pub sess_key: {
            var_name: "PROFILES_API_SESSION_KEY",
            layers: [or_default()],
            description: "The session key used by the API. When empty, a random key is generated",
            default_val_fmt: "empty",
        },
    }
}

#[cfg(debug_assertions)]
mkenv::make_config! {
    pub struct Hostname {}
}

#[cfg(not(debug_assertions))]
mkenv::make_config! {
    pub struct Hostname {
        pub host: {
            var_name: "PROFILES_API_HOST",
            description: "The origin of the website using the API (e.g. https://maps.example.com)",
        }
    }
}

mkenv::make_config! {
    pub struct ApiEnv {
        pub db_env: { DbEnv },

        pub dynamic: { DynamicApiEnv },

        pub port: {
            var_name: "PROFILES_API_PORT",
            layers: [
                parsed_from_str<u16>(),
                or_default_val(|| 3000),
            ],
            description: "The port used to expose the API",
            default_val_fmt: "3000",
        },

        pub host: { Hostname },

        pub session_ttl: {
            var_name: "PROFILES_API_SESSION_TTL",
            layers: [
                parsed_from_str<u32>(),
                or_default_val(|| 180 * 24 * 3600),
            ],
            description: "The TTL (time-to-live) of a user session (in seconds)",
            default_val_fmt: "180 days",
        },
    }
}

static ENV: OnceCell<ApiEnv> = OnceCell::new();

/// Returns a static reference to the global API environment.
///
/// **Caution**: To use this function, the [`init_env()`] function must have been called at the start
/// of the program.
pub fn env() -> &'static ApiEnv {
    ENV.get().unwrap()
}

/// Reads the environment of the API and of the library, and sets them as global.
pub fn init_env() -> anyhow::Result<&'static ApiEnv> {
    fn map_err(err: ConfigInitError<'_>) -> anyhow::Error {
        anyhow::anyhow!("{err}")
    }

    let env = ApiEnv::define();
    let lib_env = LibEnv::define();
    env.try_init().map_err(map_err)?;
    lib_env.try_init().map_err(map_err)?;
    profiles_lib::init_env(lib_env);

    Ok(ENV.get_or_init(|| env))
}

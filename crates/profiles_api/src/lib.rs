//! The library of the user profile API program.
//!
//! It contains the transport layer over the [`profiles_lib`] crate: the routes, the session
//! handling, and the conversion of the errors to HTTP responses. It is exposed as a library so
//! the tests can build the app with their own verification provider.

pub mod auth;
pub mod configure;
mod env;
mod error;
mod http;
mod utils;

pub use env::*;
pub use error::*;
pub use http::api_route;

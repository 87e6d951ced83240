//! The core of the user profile service.
//!
//! This crate contains the account linking engine, which reconciles a local account with an
//! externally verified identity, the stats aggregator, and the profile read service. It also
//! contains the environment setup and the database helpers shared by the service programs.
//!
//! If you wish to see the crate of the server program itself, take a look
//! at the [`profiles_api`](../profiles_api/index.html) package.

#![warn(missing_docs)]

mod env;
mod pool;

pub mod alerts;
pub mod error;
pub mod link;
pub mod must;
pub mod profile;
pub mod session;
pub mod stats;
pub mod sync;
pub mod verify;

pub use env::*;
pub use pool::*;

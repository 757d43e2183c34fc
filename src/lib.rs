#![doc = "The `taskmanager` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication (password and Yandex OAuth),"]
#![doc = "routing and error handling for the TaskManager service. The `taskmanager`"]
#![doc = "and `seed` binaries are thin wrappers around it."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

// The App itself is assembled in main.rs and in the integration tests, since
// `App<T>` with middleware is awkward to return from a library function.

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;

//! Portfolio site library.
//!
//! Public portfolio pages, a JSON content API, and a password-gated admin
//! editor over a Firebase Realtime Database tree. Exposed as a library so
//! the CLI and the integration tests share the same store and auth code.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use app::build_app;

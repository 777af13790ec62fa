//! Reads and writes on the portfolio tree.
//!
//! # Nodes
//!
//! - `portfolio/{profile,socials,description}` - singleton objects, replaced
//!   wholesale.
//! - `portfolio/{category}/{id}` - collection entries keyed by push id.
//! - `portfolio/admins` - admin accounts (`email`, `password_hash`), keyed by
//!   push id. Never reachable through the public category routes.

pub mod admins;
pub mod content;

/// Name of the admin collection under `portfolio`.
pub const ADMINS: &str = "admins";

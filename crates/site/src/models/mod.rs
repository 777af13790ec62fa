//! Domain models for the site.

pub mod admin;
pub mod portfolio;
pub mod session;

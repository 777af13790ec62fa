//! Portfolio Core - Shared types library.
//!
//! This crate provides the domain types used across the portfolio components:
//! - `site` - Public portfolio pages, JSON API, and the admin editor
//! - `cli` - Command-line tools for admin records and data export
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no store access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Email normalization, category classification, and store key rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

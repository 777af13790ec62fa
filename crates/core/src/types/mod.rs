//! Core types for the portfolio.
//!
//! This module provides type-safe wrappers for the few domain concepts the
//! site routes on: admin emails, portfolio categories, and store keys.

pub mod category;
pub mod email;
pub mod key;

pub use category::{Category, CategoryError, RESERVED_CATEGORIES, SINGLETON_FIELDS, SingletonField};
pub use email::{Email, EmailError};
pub use key::{KeyError, StoreKey};

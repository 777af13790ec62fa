//! Remote portfolio tree store.
//!
//! # Architecture
//!
//! - [`TreeStore`] is the seam: path-addressed get/set/update/push/delete on a
//!   hierarchical JSON tree
//! - [`RealtimeDatabase`] talks to a hosted Firebase Realtime Database over its
//!   REST API, authenticated with a service-account OAuth token
//! - [`MemoryTree`] keeps the tree in process (tests and local development)
//! - [`StoreSlot`] performs the one-time connection at startup and hands out
//!   [`Reference`]s rooted at `portfolio`
//!
//! There is no caching: every call is one round trip to the backend, and the
//! backend alone orders concurrent writes.
//!
//! # Example
//!
//! ```rust,ignore
//! let slot = StoreSlot::new();
//! slot.initialize(&config.store).await;
//!
//! let portfolio = slot.portfolio().ok_or(AppError::StoreUnavailable)?;
//! let key = portfolio.child(&projects).push(&entry).await?;
//! ```

pub mod credentials;
mod memory;
mod path;
mod push_id;
mod realtime;
mod reference;
mod slot;
pub mod token;

pub use memory::MemoryTree;
pub use path::StorePath;
pub use push_id::PushIdGenerator;
pub use realtime::RealtimeDatabase;
pub use reference::Reference;
pub use slot::{ConnectError, StoreSlot, connect};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use portfolio_core::{KeyError, StoreKey};

/// Name of the tree node every portfolio reference is rooted at.
pub const PORTFOLIO_ROOT: &str = "portfolio";

/// Errors that can occur when talking to the tree store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("{message}")]
    Status {
        /// HTTP status returned by the backend.
        status: u16,
        /// Error text returned by the backend.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Obtaining an access token failed.
    #[error("auth error: {0}")]
    Token(#[from] token::TokenError),

    /// A path segment is not a valid key.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// The backend URL cannot address tree paths.
    #[error("invalid database URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with something that is not a tree response.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A hierarchical key-value store addressed by slash-separated paths.
///
/// Absent nodes read as `Value::Null`. Writing `null` or an empty object
/// removes the node.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Read the value at `path`.
    async fn get(&self, path: &StorePath) -> Result<Value, StoreError>;

    /// Replace the value at `path` entirely.
    async fn set(&self, path: &StorePath, value: &Value) -> Result<(), StoreError>;

    /// Merge `fields` into the object at `path`, leaving other children untouched.
    async fn update(&self, path: &StorePath, fields: &Map<String, Value>)
    -> Result<(), StoreError>;

    /// Create a new child of `path` under a store-generated key.
    async fn push(&self, path: &StorePath, value: &Value) -> Result<StoreKey, StoreError>;

    /// Remove the node at `path`. Removing an absent node succeeds.
    async fn delete(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Human-readable backend description for diagnostics.
    fn describe(&self) -> String;
}

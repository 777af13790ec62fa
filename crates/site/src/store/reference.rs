//! Store references.

use std::sync::Arc;

use serde_json::{Map, Value};

use portfolio_core::StoreKey;

use super::{StoreError, StorePath, TreeStore};

/// A handle rooted at one path of the tree.
///
/// Cheap to clone; all clones share the same underlying store.
#[derive(Clone)]
pub struct Reference {
    store: Arc<dyn TreeStore>,
    path: StorePath,
}

impl Reference {
    /// Create a reference to `path` in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TreeStore>, path: StorePath) -> Self {
        Self { store, path }
    }

    /// A reference to the child `key` of this node.
    #[must_use]
    pub fn child(&self, key: &StoreKey) -> Self {
        Self {
            store: Arc::clone(&self.store),
            path: self.path.child(key),
        }
    }

    /// The last path segment, or `None` at the root.
    #[must_use]
    pub fn key(&self) -> Option<&StoreKey> {
        self.path.key()
    }

    /// The full path this reference points at.
    #[must_use]
    pub const fn path(&self) -> &StorePath {
        &self.path
    }

    /// The backend behind this reference.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Read the current value (`Value::Null` when absent).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails.
    pub async fn get(&self) -> Result<Value, StoreError> {
        self.store.get(&self.path).await
    }

    /// Replace the value entirely.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails.
    pub async fn set(&self, value: &Value) -> Result<(), StoreError> {
        self.store.set(&self.path, value).await
    }

    /// Merge `fields` into the existing object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails.
    pub async fn update(&self, fields: &Map<String, Value>) -> Result<(), StoreError> {
        self.store.update(&self.path, fields).await
    }

    /// Append `value` under a generated key and return a reference to it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails.
    pub async fn push(&self, value: &Value) -> Result<Self, StoreError> {
        let key = self.store.push(&self.path, value).await?;
        Ok(self.child(&key))
    }

    /// Remove this node.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails.
    pub async fn delete(&self) -> Result<(), StoreError> {
        self.store.delete(&self.path).await
    }
}

impl std::fmt::Debug for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reference")
            .field("store", &self.store.describe())
            .field("path", &self.path.to_string())
            .finish()
    }
}

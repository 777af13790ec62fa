//! Content repository.
//!
//! Maps a [`Category`] plus an optional entry id onto the portfolio tree.
//! Callers have already parsed the category, so `admins` cannot reach here.

use serde_json::{Map, Value};
use tracing::instrument;

use portfolio_core::{Category, RESERVED_CATEGORIES, StoreKey};

use crate::store::{Reference, StoreError};

/// Result of adding content to a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Added {
    /// A singleton was replaced.
    Replaced,
    /// A collection entry was created under this key.
    Created(StoreKey),
}

/// Repository for the public portfolio content.
pub struct ContentRepository<'a> {
    portfolio: &'a Reference,
}

impl<'a> ContentRepository<'a> {
    /// Create a repository over the `portfolio` reference.
    #[must_use]
    pub const fn new(portfolio: &'a Reference) -> Self {
        Self { portfolio }
    }

    fn category(&self, category: &Category) -> Result<Reference, StoreError> {
        let key = match category {
            Category::Singleton(field) => StoreKey::parse(field.as_str())?,
            Category::Collection(key) => key.clone(),
        };
        Ok(self.portfolio.child(&key))
    }

    /// The whole portfolio tree (`Value::Null` when empty).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    pub async fn tree(&self) -> Result<Value, StoreError> {
        self.portfolio.get().await
    }

    /// The tree without reserved collections such as `admins`.
    ///
    /// An empty tree reads as `{}`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    pub async fn public_tree(&self) -> Result<Value, StoreError> {
        let mut tree = match self.tree().await? {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        if let Value::Object(map) = &mut tree {
            for name in RESERVED_CATEGORIES {
                map.remove(*name);
            }
        }
        Ok(tree)
    }

    /// Replace a singleton, or append an entry to a collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self, entry), fields(category = %category))]
    pub async fn add(&self, category: &Category, entry: &Map<String, Value>) -> Result<Added, StoreError> {
        let target = self.category(category)?;
        let value = Value::Object(entry.clone());
        match category {
            Category::Singleton(_) => {
                target.set(&value).await?;
                Ok(Added::Replaced)
            }
            Category::Collection(_) => {
                let created = target.push(&value).await?;
                let key = created.key().cloned().ok_or_else(|| {
                    StoreError::UnexpectedResponse("push returned the root".to_string())
                })?;
                Ok(Added::Created(key))
            }
        }
    }

    /// Merge `fields` into entry `id` of `category`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self, fields), fields(category = %category, id = %id))]
    pub async fn update(
        &self,
        category: &Category,
        id: &StoreKey,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.category(category)?.child(id).update(fields).await
    }

    /// Remove entry `id` of `category`. Removing a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self), fields(category = %category, id = %id))]
    pub async fn delete(&self, category: &Category, id: &StoreKey) -> Result<(), StoreError> {
        self.category(category)?.child(id).delete().await
    }
}

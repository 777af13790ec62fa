//! Portfolio category classification.
//!
//! The portfolio tree has two kinds of top-level fields. Singleton fields hold
//! one object that is replaced wholesale on write. Every other name is a
//! collection of entries keyed by store-generated ids. A small set of names is
//! reserved for privileged data and is never reachable through the public
//! category routes.

use core::fmt;

use crate::types::key::{KeyError, StoreKey};

/// Top-level fields that hold exactly one object.
pub const SINGLETON_FIELDS: &[&str] = &["profile", "socials", "description"];

/// Top-level fields that generic category routes must never touch.
pub const RESERVED_CATEGORIES: &[&str] = &["admins"];

/// Errors that can occur when classifying a category name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// The name is not a valid store key.
    #[error("invalid category: {0}")]
    InvalidKey(#[from] KeyError),
    /// The name refers to privileged data.
    #[error("category {0} is reserved")]
    Reserved(String),
}

/// A singleton field of the portfolio tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonField {
    Profile,
    Socials,
    Description,
}

impl SingletonField {
    /// All singleton fields, in display order.
    pub const ALL: [Self; 3] = [Self::Profile, Self::Socials, Self::Description];

    /// The field's name in the tree.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Socials => "socials",
            Self::Description => "description",
        }
    }

    /// Look up a singleton field by its tree name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for SingletonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category addressed by the `/api/{category}` routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// A singleton field, replaced wholesale on write.
    Singleton(SingletonField),
    /// A collection of entries keyed by generated ids.
    Collection(StoreKey),
}

impl Category {
    /// Classify a URL path segment.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Reserved` for privileged names such as `admins`,
    /// and `CategoryError::InvalidKey` if the name cannot be a store key.
    ///
    /// ```
    /// use portfolio_core::{Category, SingletonField};
    ///
    /// assert_eq!(
    ///     Category::parse("profile").unwrap(),
    ///     Category::Singleton(SingletonField::Profile)
    /// );
    /// assert!(Category::parse("projects").unwrap().is_collection());
    /// assert!(Category::parse("admins").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, CategoryError> {
        if RESERVED_CATEGORIES.contains(&name) {
            return Err(CategoryError::Reserved(name.to_owned()));
        }

        if let Some(field) = SingletonField::from_name(name) {
            return Ok(Self::Singleton(field));
        }

        Ok(Self::Collection(StoreKey::parse(name)?))
    }

    /// The category's name in the tree.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Singleton(field) => field.as_str(),
            Self::Collection(key) => key.as_str(),
        }
    }

    /// Returns true for collection categories.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Returns true if a top-level tree field with this name is rendered as a
    /// collection section (i.e. it is neither a singleton nor reserved).
    #[must_use]
    pub fn is_public_collection_name(name: &str) -> bool {
        !RESERVED_CATEGORIES.contains(&name) && SingletonField::from_name(name).is_none()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        for name in SINGLETON_FIELDS {
            let category = Category::parse(name).unwrap();
            assert!(!category.is_collection());
            assert_eq!(category.as_str(), *name);
        }
    }

    #[test]
    fn test_collections() {
        let category = Category::parse("certifications").unwrap();
        assert!(category.is_collection());
        assert_eq!(category.to_string(), "certifications");
    }

    #[test]
    fn test_reserved() {
        assert_eq!(
            Category::parse("admins"),
            Err(CategoryError::Reserved("admins".to_string()))
        );
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            Category::parse("bad.name"),
            Err(CategoryError::InvalidKey(_))
        ));
        assert!(matches!(
            Category::parse(""),
            Err(CategoryError::InvalidKey(KeyError::Empty))
        ));
    }

    #[test]
    fn test_singleton_names_are_case_sensitive() {
        assert!(Category::parse("Profile").unwrap().is_collection());
    }

    #[test]
    fn test_public_collection_name() {
        assert!(Category::is_public_collection_name("projects"));
        assert!(!Category::is_public_collection_name("profile"));
        assert!(!Category::is_public_collection_name("admins"));
    }
}

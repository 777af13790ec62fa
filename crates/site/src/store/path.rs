//! Validated tree paths.

use core::fmt;

use portfolio_core::{KeyError, StoreKey};

/// A path into the tree: zero or more validated keys.
///
/// The empty path addresses the root of the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorePath(Vec<StoreKey>);

impl StorePath {
    /// The database root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a slash-separated path. Empty segments are ignored, so
    /// `"/portfolio//admins/"` is `portfolio/admins`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if any segment is not a valid key.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        s.split('/')
            .filter(|segment| !segment.is_empty())
            .map(StoreKey::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn child(&self, key: &StoreKey) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.clone());
        Self(segments)
    }

    /// Returns a new path with every segment of `relative` appended.
    #[must_use]
    pub fn join(&self, relative: &Self) -> Self {
        let mut segments = self.0.clone();
        segments.extend(relative.0.iter().cloned());
        Self(segments)
    }

    /// The last segment, or `None` at the root.
    #[must_use]
    pub fn key(&self) -> Option<&StoreKey> {
        self.0.last()
    }

    /// Iterate over the segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &StoreKey> {
        self.0.iter()
    }

    /// Returns true for the database root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(key.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_empty_segments() {
        let path = StorePath::parse("/portfolio//admins/").unwrap();
        assert_eq!(path.to_string(), "/portfolio/admins");
        assert_eq!(path.key().unwrap().as_str(), "admins");
    }

    #[test]
    fn test_root() {
        let root = StorePath::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root, StorePath::root());
        assert_eq!(root.to_string(), "/");
        assert!(root.key().is_none());
    }

    #[test]
    fn test_parse_rejects_invalid_segment() {
        assert!(StorePath::parse("portfolio/bad.key").is_err());
    }

    #[test]
    fn test_child_and_join() {
        let base = StorePath::parse("portfolio").unwrap();
        let child = base.child(&StoreKey::parse("projects").unwrap());
        assert_eq!(child.to_string(), "/portfolio/projects");

        let joined = base.join(&StorePath::parse("a/b").unwrap());
        assert_eq!(joined.segments().count(), 3);
    }
}

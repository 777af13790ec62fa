//! Store key type.
//!
//! Every path segment that reaches the remote tree - category names from the
//! URL, entry ids, generated push keys - is a [`StoreKey`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key is empty.
    #[error("key cannot be empty")]
    Empty,
    /// The key is longer than the store accepts.
    #[error("key must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length in bytes.
        max: usize,
    },
    /// The key contains a character the store forbids.
    #[error("key contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

/// A single segment of a path in the portfolio tree.
///
/// ## Constraints
///
/// - 1-768 bytes of UTF-8
/// - None of `.` `$` `#` `[` `]` `/`
/// - No ASCII control characters
///
/// ```
/// use portfolio_core::StoreKey;
///
/// assert!(StoreKey::parse("certifications").is_ok());
/// assert!(StoreKey::parse("-NqXf3kz0aBcDeFgHiJk").is_ok());
/// assert!(StoreKey::parse("a/b").is_err());
/// assert!(StoreKey::parse("v1.2").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct StoreKey(String);

impl StoreKey {
    /// Maximum key length in bytes.
    pub const MAX_LENGTH: usize = 768;

    /// Characters that may never appear in a key.
    pub const FORBIDDEN: &'static [char] = &['.', '$', '#', '[', ']', '/'];

    /// Parse a `StoreKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, too long, or contains a
    /// forbidden or control character.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        if s.is_empty() {
            return Err(KeyError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(KeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| Self::FORBIDDEN.contains(c) || c.is_ascii_control())
        {
            return Err(KeyError::ForbiddenChar(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StoreKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreKey> for String {
    fn from(key: StoreKey) -> Self {
        key.0
    }
}

impl AsRef<str> for StoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(StoreKey::parse("profile").is_ok());
        assert!(StoreKey::parse("side projects").is_ok());
        assert!(StoreKey::parse("über").is_ok());
        assert!(StoreKey::parse("-NqXf3kz0aBcDeFgHiJk").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(StoreKey::parse(""), Err(KeyError::Empty));
    }

    #[test]
    fn test_parse_forbidden_chars() {
        for bad in ["a.b", "a$b", "a#b", "a[b", "a]b", "a/b"] {
            assert!(
                matches!(StoreKey::parse(bad), Err(KeyError::ForbiddenChar(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_control_chars() {
        assert_eq!(
            StoreKey::parse("tab\there"),
            Err(KeyError::ForbiddenChar('\t'))
        );
        assert_eq!(
            StoreKey::parse("del\u{7f}"),
            Err(KeyError::ForbiddenChar('\u{7f}'))
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = "k".repeat(StoreKey::MAX_LENGTH + 1);
        assert!(matches!(
            StoreKey::parse(&long),
            Err(KeyError::TooLong { .. })
        ));
        assert!(StoreKey::parse(&"k".repeat(StoreKey::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let key: StoreKey = serde_json::from_str("\"projects\"").unwrap();
        assert_eq!(key.as_str(), "projects");
        assert!(serde_json::from_str::<StoreKey>("\"a/b\"").is_err());
    }
}

//! Admin records stored under `portfolio/admins`.

use serde::{Deserialize, Serialize};

/// One entry of the `admins` collection.
///
/// Missing fields deserialize as empty strings, which never match a login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    /// Normalized (trimmed, lowercased) email address.
    #[serde(default)]
    pub email: String,
    /// Password hash in a format `verify_password` understands.
    #[serde(default)]
    pub password_hash: String,
}

impl AdminRecord {
    /// Parse a record, returning `None` for non-object values.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

/// Claims carried by an authenticated session.
///
/// A single-role site only needs the admin flag; further capabilities belong
/// here rather than in separate session keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Whether the session belongs to a logged-in admin.
    pub admin: bool,
}

impl SessionClaims {
    /// Claims for a freshly logged-in admin.
    #[must_use]
    pub const fn admin() -> Self {
        Self { admin: true }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the session's [`super::SessionClaims`].
    pub const CLAIMS: &str = "admin";
}

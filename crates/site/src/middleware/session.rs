//! Session middleware configuration.
//!
//! Sessions live in process memory; the cookie carries only the signed
//! session id. A restart logs every admin out.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::warn;

use crate::config::SiteConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portfolio_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Derive the cookie signing key.
///
/// The configured secret is stretched to 64 bytes with SHA-512. Without one,
/// a random key is used for the life of the process.
#[must_use]
pub fn signing_key(config: &SiteConfig) -> Key {
    let Some(secret) = &config.session_secret else {
        warn!("PORTFOLIO_SESSION_SECRET not set; using a random session key");
        return Key::generate();
    };

    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::try_from(digest.as_slice()).unwrap_or_else(|_| Key::generate())
}

/// Create the session layer with an in-memory store and signed cookies.
#[must_use]
pub fn create_session_layer(config: &SiteConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_signing_key_is_stable_for_a_secret() {
        let config = SiteConfig {
            session_secret: Some(SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%")),
            ..SiteConfig::for_testing()
        };
        assert_eq!(
            signing_key(&config).master(),
            signing_key(&config).master()
        );
    }

    #[test]
    fn test_random_key_without_secret() {
        let config = SiteConfig::for_testing();
        assert_ne!(
            signing_key(&config).master(),
            signing_key(&config).master()
        );
    }
}

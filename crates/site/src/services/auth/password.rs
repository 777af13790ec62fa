//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings. Two salted legacy formats are still
//! accepted so existing admin records keep working:
//!
//! - `pbkdf2:<sha256|sha512>[:<iterations>]$<salt>$<hex>`
//! - `scrypt[:<n>:<r>:<p>]$<salt>$<hex>`
//!
//! In both, the salt is used as its UTF-8 bytes and the derived key length is
//! the length of the stored digest.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Sha256, Sha512};

use super::AuthError;

/// Minimum password length for new admins.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;
const DEFAULT_SCRYPT_N: u64 = 1 << 15;
const DEFAULT_SCRYPT_R: u32 = 8;
const DEFAULT_SCRYPT_P: u32 = 1;

/// Upper bound on a stored digest, in bytes.
const MAX_DIGEST_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pbkdf2Digest {
    Sha256,
    Sha512,
}

#[derive(Debug)]
enum LegacyMethod {
    Pbkdf2 {
        digest: Pbkdf2Digest,
        iterations: u32,
    },
    Scrypt {
        log_n: u8,
        r: u32,
        p: u32,
    },
}

/// Validate a new password.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash in any supported format.
///
/// Unknown or malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with('$') {
        return verify_argon2(password, stored);
    }
    verify_legacy(password, stored).unwrap_or(false)
}

fn verify_argon2(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Returns `None` when the stored string is not a recognizable legacy hash.
fn verify_legacy(password: &str, stored: &str) -> Option<bool> {
    let mut parts = stored.splitn(3, '$');
    let method = parse_method(parts.next()?)?;
    let salt = parts.next()?;
    let expected = hex::decode(parts.next()?).ok()?;
    if expected.is_empty() || expected.len() > MAX_DIGEST_LEN {
        return None;
    }

    let mut derived = vec![0u8; expected.len()];
    match method {
        LegacyMethod::Pbkdf2 { digest, iterations } => match digest {
            Pbkdf2Digest::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(
                password.as_bytes(),
                salt.as_bytes(),
                iterations,
                &mut derived,
            ),
            Pbkdf2Digest::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(
                password.as_bytes(),
                salt.as_bytes(),
                iterations,
                &mut derived,
            ),
        },
        LegacyMethod::Scrypt { log_n, r, p } => {
            let params = scrypt::Params::new(log_n, r, p, derived.len()).ok()?;
            scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut derived).ok()?;
        }
    }

    Some(constant_time_eq(&derived, &expected))
}

fn parse_method(method: &str) -> Option<LegacyMethod> {
    let mut fields = method.split(':');
    match fields.next()? {
        "pbkdf2" => {
            let digest = match fields.next().unwrap_or("sha256") {
                "sha256" => Pbkdf2Digest::Sha256,
                "sha512" => Pbkdf2Digest::Sha512,
                _ => return None,
            };
            let iterations = match fields.next() {
                Some(raw) => raw.parse::<u32>().ok().filter(|&n| n > 0)?,
                None => DEFAULT_PBKDF2_ITERATIONS,
            };
            fields
                .next()
                .is_none()
                .then_some(LegacyMethod::Pbkdf2 { digest, iterations })
        }
        "scrypt" => {
            let (n, r, p) = match (fields.next(), fields.next(), fields.next()) {
                (None, None, None) => (DEFAULT_SCRYPT_N, DEFAULT_SCRYPT_R, DEFAULT_SCRYPT_P),
                (Some(n), Some(r), Some(p)) => (
                    n.parse::<u64>().ok()?,
                    r.parse::<u32>().ok()?,
                    p.parse::<u32>().ok()?,
                ),
                _ => return None,
            };
            if !n.is_power_of_two() || n < 2 || fields.next().is_some() {
                return None;
            }
            let log_n = u8::try_from(n.trailing_zeros()).ok()?;
            Some(LegacyMethod::Scrypt { log_n, r, p })
        }
        _ => None,
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PASSWORD: &str = "correct horse";

    const PBKDF2_SHA256: &str = "pbkdf2:sha256:1000$8fKq2LmZ$f4707d5ecb7eb03dd3d13142aaee0f338d036947a42c07693ab048efbf2b49b6";
    const PBKDF2_SHA512: &str = "pbkdf2:sha512:1000$8fKq2LmZ$3b6139b75c924ac148f407956fda42f5af431f2309d0c9c449c71b075aec4395741a80acea7e5df558912a37cc737396716f89bf75f079bc7e6e9ea4e05d85de";
    const SCRYPT: &str = "scrypt:1024:8:1$Qx7mN2pA$2e4d655155a82d169527e8caa6365d00d464b66b7150d0a7627185478edcae9ba511138820499d679f0f90c9c7129af1b1791bc1c265a81f0a7064fe4bbf0088";

    #[test]
    fn test_argon2_hash_verifies() {
        let hash = hash_password(PASSWORD).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(PASSWORD, &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_pbkdf2_vectors() {
        assert!(verify_password(PASSWORD, PBKDF2_SHA256));
        assert!(verify_password(PASSWORD, PBKDF2_SHA512));
        assert!(!verify_password("Correct horse", PBKDF2_SHA256));
    }

    #[test]
    fn test_scrypt_vector() {
        assert!(verify_password(PASSWORD, SCRYPT));
        assert!(!verify_password("", SCRYPT));
    }

    #[test]
    fn test_tampered_digest_fails() {
        let tampered = PBKDF2_SHA256.replace("f4707d", "f4707e");
        assert!(!verify_password(PASSWORD, &tampered));
    }

    #[test]
    fn test_unknown_and_malformed_hashes_fail() {
        for stored in [
            "",
            "plaintext",
            "md5$salt$abcdef",
            "pbkdf2:sha1:1000$salt$abcd",
            "pbkdf2:sha256:0$salt$abcd",
            "pbkdf2:sha256:1000$salt$not-hex",
            "pbkdf2:sha256:1000$salt",
            "scrypt:1000:8:1$salt$abcd",
            "scrypt:1024:8$salt$abcd",
            "$argon2id$garbage",
        ] {
            assert!(!verify_password(PASSWORD, stored), "{stored:?} verified");
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
    }
}

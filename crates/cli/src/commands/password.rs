//! `hash-password`

use std::io::Write;

use portfolio_site::services::auth::{hash_password, validate_password};

use super::{CommandError, read_password};

/// Read a password from stdin and print its Argon2id hash.
///
/// # Errors
///
/// Returns an error if the password is empty, too short, or cannot be hashed.
pub fn hash_from_stdin() -> Result<(), CommandError> {
    let password = read_password(&mut std::io::stdin().lock())?;
    validate_password(&password)?;
    let hash = hash_password(&password)?;
    writeln!(std::io::stdout().lock(), "{hash}")?;
    Ok(())
}

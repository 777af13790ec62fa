//! Command implementations.

pub mod admin;
pub mod export;
pub mod password;

use std::io::BufRead;

use portfolio_site::config::{ConfigError, StoreConfig};
use portfolio_site::services::auth::AuthError;
use portfolio_site::store::{Reference, StoreError, StoreSlot};
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be reached; details were logged.
    #[error("store unavailable (see log for the cause)")]
    Unavailable,

    /// Store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Admin provisioning failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Reading stdin or writing stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No password on stdin.
    #[error("no password given on stdin")]
    EmptyPassword,
}

/// Connect with the server's store settings and return the `portfolio` node.
async fn portfolio() -> Result<Reference, CommandError> {
    let config = StoreConfig::from_env()?;
    let slot = StoreSlot::new();
    slot.initialize(&config).await;
    slot.portfolio().ok_or(CommandError::Unavailable)
}

/// Read one line from `input` as a password, without its line ending.
fn read_password(input: &mut impl BufRead) -> Result<String, CommandError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::EmptyPassword);
    }
    Ok(password.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_line_ending() {
        let mut input = "hunter2 with spaces \r\n".as_bytes();
        assert_eq!(read_password(&mut input).unwrap(), "hunter2 with spaces ");
    }

    #[test]
    fn test_read_password_rejects_empty() {
        let mut input = "\n".as_bytes();
        assert!(matches!(
            read_password(&mut input),
            Err(CommandError::EmptyPassword)
        ));
    }
}

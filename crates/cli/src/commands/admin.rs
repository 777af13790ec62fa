//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin; the password is read from stdin
//! printf '%s\n' 'long passphrase' | portfolio-cli admin add -e admin@example.com
//!
//! # List admins
//! portfolio-cli admin list
//! ```

use std::io::Write;

use portfolio_site::services::auth::AuthService;

use super::{CommandError, portfolio, read_password};

/// Add an admin record under `portfolio/admins`.
///
/// # Errors
///
/// Returns an error if the email is invalid or already registered, the
/// password is too short, or the store cannot be written.
pub async fn add(email: &str) -> Result<(), CommandError> {
    let password = read_password(&mut std::io::stdin().lock())?;
    let portfolio = portfolio().await?;

    let key = AuthService::new(&portfolio)
        .register_admin(email, &password)
        .await?;

    tracing::info!(key = %key, "Admin created");
    Ok(())
}

/// Print every admin email, one per line.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list() -> Result<(), CommandError> {
    let portfolio = portfolio().await?;
    let emails = AuthService::new(&portfolio).admin_emails().await?;

    let mut out = std::io::stdout().lock();
    for email in emails {
        writeln!(out, "{email}")?;
    }
    Ok(())
}

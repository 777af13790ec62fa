//! `export`

use std::io::Write;

use super::{CommandError, portfolio};

/// Print the `portfolio` tree as pretty JSON.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn export() -> Result<(), CommandError> {
    let tree = portfolio().await?.get().await?;
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &tree)?;
    writeln!(out)?;
    Ok(())
}

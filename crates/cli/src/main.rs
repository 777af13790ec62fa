//! Portfolio CLI - admin account and content tools.
//!
//! # Usage
//!
//! ```bash
//! # Print an Argon2 hash for a password read from stdin
//! echo 'secret password' | portfolio-cli hash-password
//!
//! # Add an admin (password read from stdin)
//! portfolio-cli admin add -e admin@example.com
//!
//! # List admin emails
//! portfolio-cli admin list
//!
//! # Dump the portfolio tree as JSON
//! portfolio-cli export > portfolio.json
//! ```
//!
//! Store settings come from the same environment variables as the server.
//! Logs go to stderr so stdout stays machine-readable.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "portfolio-cli")]
#[command(author, version, about = "Portfolio site CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Hash a password read from stdin
    HashPassword,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Print the whole portfolio tree as JSON
    Export,
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Add an admin; the password is read from stdin
    Add {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
    /// List admin emails
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_cli=info,portfolio_site=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::HashPassword => commands::password::hash_from_stdin()?,
        Commands::Admin { action } => match action {
            AdminAction::Add { email } => {
                commands::admin::add(&email).await?;
            }
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Export => commands::export::export().await?,
    }
    Ok(())
}

//! One-time store connection.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use portfolio_core::StoreKey;

use super::credentials::{CredentialSource, CredentialsError};
use super::token::{ServiceAccountTokenSource, TokenError};
use super::{MemoryTree, PORTFOLIO_ROOT, RealtimeDatabase, Reference, StoreError, StorePath, TreeStore};
use crate::config::{StoreBackend, StoreConfig};

/// Errors that prevent a store from being constructed.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No credential source is available.
    #[error("no Firebase credentials found (set FIREBASE_SERVICE_ACCOUNT or provide a key file)")]
    NoCredentials,

    /// Credentials exist but cannot be loaded.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The private key cannot sign tokens.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The database URL is unusable.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The seed file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not valid JSON.
    #[error("invalid seed file: {0}")]
    SeedParse(#[from] serde_json::Error),
}

/// Build the configured backend.
///
/// # Errors
///
/// Returns `ConnectError` if the backend cannot be constructed.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn TreeStore>, ConnectError> {
    match config.backend {
        StoreBackend::Memory => {
            let Some(path) = &config.seed_file else {
                return Ok(Arc::new(MemoryTree::new()));
            };
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConnectError::Seed {
                    path: path.clone(),
                    source,
                })?;
            Ok(Arc::new(MemoryTree::with_root(serde_json::from_str(&raw)?)))
        }
        StoreBackend::Firebase => {
            let client = reqwest::Client::new();

            if let Some(host) = &config.emulator_host {
                warn!(host = %host, "Using Realtime Database emulator without authentication");
                return Ok(Arc::new(RealtimeDatabase::emulator(
                    client,
                    host,
                    &config.database_url,
                )?));
            }

            let source = CredentialSource::resolve(config).ok_or(ConnectError::NoCredentials)?;
            let account = source.load(config)?;
            info!(
                source = %source.describe(),
                client_email = %account.client_email,
                "Loaded service account credentials"
            );
            let tokens = ServiceAccountTokenSource::new(client.clone(), &account)?;
            Ok(Arc::new(RealtimeDatabase::new(
                client,
                config.database_url.clone(),
                tokens,
            )))
        }
    }
}

/// Holds the store once startup has tried to connect.
///
/// Initialization runs at most once. A failed attempt leaves the slot empty
/// for the life of the process and every store-backed operation reports the
/// store as unavailable.
pub struct StoreSlot {
    cell: OnceCell<Option<Arc<dyn TreeStore>>>,
}

impl StoreSlot {
    /// A slot that has not been initialized yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// A slot already holding `store`.
    #[must_use]
    pub fn with_store(store: Arc<dyn TreeStore>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Some(store))),
        }
    }

    /// A slot whose initialization already failed.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            cell: OnceCell::new_with(Some(None)),
        }
    }

    /// Connect using `config` unless a previous call already did.
    ///
    /// Returns whether a store is available. Connection failures are logged,
    /// never returned.
    pub async fn initialize(&self, config: &StoreConfig) -> bool {
        self.cell
            .get_or_init(|| async {
                match connect(config).await {
                    Ok(store) => {
                        info!(backend = %store.describe(), "Store initialized");
                        Some(store)
                    }
                    Err(e) => {
                        error!(error = %e, "Store initialization failed");
                        None
                    }
                }
            })
            .await
            .is_some()
    }

    /// The connected store, if any.
    #[must_use]
    pub fn store(&self) -> Option<&Arc<dyn TreeStore>> {
        self.cell.get().and_then(Option::as_ref)
    }

    /// A reference to the `portfolio` node, if a store is connected.
    #[must_use]
    pub fn portfolio(&self) -> Option<Reference> {
        let store = self.store()?;
        let root = StoreKey::parse(PORTFOLIO_ROOT).ok()?;
        Some(Reference::new(
            Arc::clone(store),
            StorePath::root().child(&root),
        ))
    }
}

impl Default for StoreSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "uninitialized".to_string(),
            Some(None) => "unavailable".to_string(),
            Some(Some(store)) => store.describe(),
        };
        f.debug_struct("StoreSlot").field("store", &state).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_memory_backend_initializes() {
        let slot = StoreSlot::new();
        assert!(slot.portfolio().is_none());
        assert!(slot.initialize(&StoreConfig::for_testing()).await);

        let portfolio = slot.portfolio().unwrap();
        assert_eq!(portfolio.path().to_string(), "/portfolio");
    }

    #[tokio::test]
    async fn test_seed_file_is_loaded() {
        let seed = std::env::temp_dir().join(format!("portfolio-seed-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&seed, json!({"portfolio": {"profile": {"name": "M"}}}).to_string())
            .unwrap();
        let config = StoreConfig {
            seed_file: Some(seed),
            ..StoreConfig::for_testing()
        };

        let slot = StoreSlot::new();
        assert!(slot.initialize(&config).await);
        let portfolio = slot.portfolio().unwrap();
        assert_eq!(portfolio.get().await.unwrap()["profile"]["name"], "M");
    }

    #[tokio::test]
    async fn test_missing_credentials_leave_slot_empty() {
        let dir = std::env::temp_dir().join(format!("portfolio-none-{}", uuid::Uuid::new_v4()));
        let config = StoreConfig {
            backend: StoreBackend::Firebase,
            secret_path: dir.join("secret.json"),
            local_credentials_path: dir.join("serviceAccount.json"),
            ..StoreConfig::for_testing()
        };

        let slot = StoreSlot::new();
        assert!(!slot.initialize(&config).await);
        assert!(slot.portfolio().is_none());
        assert!(matches!(
            connect(&config).await,
            Err(ConnectError::NoCredentials)
        ));
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let slot = StoreSlot::unavailable();
        // Already settled; a working config does not retry.
        assert!(!slot.initialize(&StoreConfig::for_testing()).await);
        assert!(format!("{slot:?}").contains("unavailable"));
    }

    #[tokio::test]
    async fn test_emulator_needs_no_credentials() {
        let config = StoreConfig {
            backend: StoreBackend::Firebase,
            emulator_host: Some("localhost:9000".to_string()),
            ..StoreConfig::for_testing()
        };
        let store = connect(&config).await.unwrap();
        assert!(store.describe().starts_with("emulator"));
    }
}

//! Service-account credential sourcing.
//!
//! Credentials are looked up in order:
//!
//! 1. Inline JSON in `FIREBASE_SERVICE_ACCOUNT` (hosting platforms that only
//!    offer environment variables). Escaped `\n` sequences in `private_key`
//!    are turned back into newlines.
//! 2. The platform secret file (default `/etc/secrets/FIREBASE_SERVICE_ACCOUNT`).
//! 3. A local `serviceAccount.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::StoreConfig;

/// Environment variable holding inline service-account JSON.
pub const INLINE_ENV_VAR: &str = "FIREBASE_SERVICE_ACCOUNT";

/// Default OAuth token endpoint for Google service accounts.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Errors that can occur while loading credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No credential source is configured or present on disk.
    #[error("no service account credentials found")]
    Missing,

    /// The credential file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential payload is not valid service-account JSON.
    #[error("invalid service account JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload is some other kind of credential.
    #[error("expected a service_account credential, got {0:?}")]
    WrongType(String),
}

/// Where the service-account credentials came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Inline JSON from the environment.
    Inline,
    /// A JSON file on disk.
    File(PathBuf),
}

impl CredentialSource {
    /// Pick the first available source, or `None` if there is none.
    #[must_use]
    pub fn resolve(config: &StoreConfig) -> Option<Self> {
        if config
            .inline_credentials
            .as_ref()
            .is_some_and(|json| !json.expose_secret().trim().is_empty())
        {
            return Some(Self::Inline);
        }

        [&config.secret_path, &config.local_credentials_path]
            .into_iter()
            .find(|path| path.is_file())
            .map(|path| Self::File(path.clone()))
    }

    /// A non-secret description of the source for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Inline => format!("env:{INLINE_ENV_VAR}"),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// The file path, for file sources.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Inline => None,
            Self::File(path) => Some(path),
        }
    }

    /// Load and validate the service account.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError` if the payload cannot be read or parsed.
    pub fn load(&self, config: &StoreConfig) -> Result<ServiceAccount, CredentialsError> {
        match self {
            Self::Inline => {
                let json = config
                    .inline_credentials
                    .as_ref()
                    .ok_or(CredentialsError::Missing)?;
                ServiceAccount::from_inline_json(json.expose_secret())
            }
            Self::File(path) => ServiceAccount::from_json(&read_file(path)?),
        }
    }

    /// Best-effort read of the `project_id` field. Never fails.
    #[must_use]
    pub fn project_id(&self, config: &StoreConfig) -> Option<String> {
        let raw = match self {
            Self::Inline => config.inline_credentials.as_ref()?.expose_secret().to_owned(),
            Self::File(path) => read_file(path).ok()?,
        };
        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        value.get("project_id")?.as_str().map(str::to_owned)
    }
}

fn read_file(path: &Path) -> Result<String, CredentialsError> {
    std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The parts of a Google service-account key the store client needs.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct ServiceAccount {
    /// Cloud project the account belongs to.
    pub project_id: Option<String>,
    /// Identifier of the signing key, sent as the JWT `kid`.
    pub private_key_id: Option<String>,
    /// PEM-encoded RSA private key.
    pub private_key: SecretString,
    /// Service account email, the JWT issuer.
    pub client_email: String,
    /// OAuth token endpoint.
    pub token_uri: String,
}

#[derive(Deserialize)]
struct RawServiceAccount {
    #[serde(rename = "type")]
    kind: Option<String>,
    project_id: Option<String>,
    private_key_id: Option<String>,
    private_key: String,
    client_email: String,
    token_uri: Option<String>,
}

impl ServiceAccount {
    /// Parse a service-account key file.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError` if the JSON is malformed, lacks required
    /// fields, or is not a `service_account` credential.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let raw: RawServiceAccount = serde_json::from_str(json)?;

        if let Some(kind) = raw.kind.as_deref()
            && kind != "service_account"
        {
            return Err(CredentialsError::WrongType(kind.to_owned()));
        }

        Ok(Self {
            project_id: raw.project_id,
            private_key_id: raw.private_key_id,
            private_key: SecretString::from(raw.private_key),
            client_email: raw.client_email,
            token_uri: raw
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
        })
    }

    /// Parse service-account JSON passed through an environment variable,
    /// where newlines in the private key arrive as literal `\n`.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceAccount::from_json`].
    pub fn from_inline_json(json: &str) -> Result<Self, CredentialsError> {
        let mut account = Self::from_json(json)?;
        account.private_key =
            SecretString::from(account.private_key.expose_secret().replace("\\n", "\n"));
        Ok(account)
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[REDACTED]")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

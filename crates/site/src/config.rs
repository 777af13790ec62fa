//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Store
//! - `FIREBASE_DATABASE_URL` - Realtime Database URL (default: the portfolio instance)
//! - `FIREBASE_SERVICE_ACCOUNT` - Inline service-account JSON
//! - `FIREBASE_SECRET_PATH` - Secret file path (default: /etc/secrets/FIREBASE_SERVICE_ACCOUNT)
//! - `FIREBASE_LOCAL_CREDENTIALS` - Local key file (default: serviceAccount.json)
//! - `FIREBASE_DATABASE_EMULATOR_HOST` - Talk to an emulator instead (no auth)
//! - `PORTFOLIO_STORE` - `firebase` (default) or `memory`
//! - `PORTFOLIO_SEED_FILE` - JSON loaded into the memory store at startup
//!
//! ## Server
//! - `PORTFOLIO_HOST` - Bind address (default: 0.0.0.0)
//! - `PORTFOLIO_PORT` - Listen port (falls back to `PORT`, then 5000)
//! - `PORTFOLIO_BASE_URL` - Public URL (default: `http://localhost:<port>`)
//! - `PORTFOLIO_SESSION_SECRET` - Cookie signing secret (min 32 chars, high entropy).
//!   A random key is generated when unset, which logs every admin out on restart.
//! - `PORTFOLIO_REDACT_ERRORS` - Hide backend error text from API clients (default: false)
//! - `PORTFOLIO_LOG_FORMAT` - `pretty` (default) or `json`
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Production database used when `FIREBASE_DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str =
    "https://portfolio-madesh-default-rtdb.asia-southeast1.firebasedatabase.app/";

const DEFAULT_SECRET_PATH: &str = "/etc/secrets/FIREBASE_SERVICE_ACCOUNT";
const DEFAULT_LOCAL_CREDENTIALS: &str = "serviceAccount.json";
const DEFAULT_PORT: u16 = 5000;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which tree store backs the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Firebase Realtime Database (or its emulator).
    #[default]
    Firebase,
    /// In-process tree, lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'firebase' or 'memory', got '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Store connection settings.
///
/// Implements `Debug` manually to redact inline credentials.
#[derive(Clone)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,
    /// Realtime Database URL
    pub database_url: Url,
    /// Inline service-account JSON
    pub inline_credentials: Option<SecretString>,
    /// Platform secret file
    pub secret_path: PathBuf,
    /// Local key file
    pub local_credentials_path: PathBuf,
    /// Emulator `host:port`
    pub emulator_host: Option<String>,
    /// JSON tree loaded into the memory backend
    pub seed_file: Option<PathBuf>,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("database_url", &self.database_url.as_str())
            .field(
                "inline_credentials",
                &self.inline_credentials.as_ref().map(|_| "[REDACTED]"),
            )
            .field("secret_path", &self.secret_path)
            .field("local_credentials_path", &self.local_credentials_path)
            .field("emulator_host", &self.emulator_host)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}

impl StoreConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let raw_url = vars.get_or("FIREBASE_DATABASE_URL", DEFAULT_DATABASE_URL);
        let database_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FIREBASE_DATABASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            backend: vars.parse_or("PORTFOLIO_STORE", StoreBackend::Firebase)?,
            database_url,
            inline_credentials: vars.get("FIREBASE_SERVICE_ACCOUNT").map(SecretString::from),
            secret_path: vars.get_or("FIREBASE_SECRET_PATH", DEFAULT_SECRET_PATH).into(),
            local_credentials_path: vars
                .get_or("FIREBASE_LOCAL_CREDENTIALS", DEFAULT_LOCAL_CREDENTIALS)
                .into(),
            emulator_host: vars.get("FIREBASE_DATABASE_EMULATOR_HOST"),
            seed_file: vars.get("PORTFOLIO_SEED_FILE").map(PathBuf::from),
        })
    }

    /// Load store settings alone (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(&Vars::process())
    }

    /// An in-memory store with no credentials on disk.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: Url::parse("https://portfolio-test-default-rtdb.firebaseio.com/")
                .unwrap_or_else(|_| unreachable!("static URL parses")),
            inline_credentials: None,
            secret_path: PathBuf::from("/nonexistent/portfolio/secret.json"),
            local_credentials_path: PathBuf::from("/nonexistent/portfolio/serviceAccount.json"),
            emulator_host: None,
            seed_file: None,
        }
    }
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Session signing secret; `None` means a per-process random key
    pub session_secret: Option<SecretString>,
    /// Replace backend error text with an abstract tag in API responses
    pub redact_errors: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Store connection settings
    pub store: StoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the session secret
    /// fails validation (length, placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&Vars::process())
    }

    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let host = vars.parse_or("PORTFOLIO_HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = match vars.get("PORTFOLIO_PORT") {
            Some(_) => vars.parse_or("PORTFOLIO_PORT", DEFAULT_PORT)?,
            None => vars.parse_or("PORT", DEFAULT_PORT)?,
        };
        let base_url = vars
            .get("PORTFOLIO_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let session_secret = match vars.get("PORTFOLIO_SESSION_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "PORTFOLIO_SESSION_SECRET")?;
                let secret = SecretString::from(value);
                validate_session_secret(&secret, "PORTFOLIO_SESSION_SECRET")?;
                Some(secret)
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            redact_errors: vars.flag("PORTFOLIO_REDACT_ERRORS")?,
            log_format: vars.parse_or("PORTFOLIO_LOG_FORMAT", LogFormat::Pretty)?,
            store: StoreConfig::from_vars(vars)?,
            sentry_dsn: vars.get("SENTRY_DSN"),
            sentry_environment: vars.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: vars.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration for tests: memory store, random session key.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            base_url: format!("http://localhost:{DEFAULT_PORT}"),
            session_secret: None,
            redact_errors: false,
            log_format: LogFormat::Pretty,
            store: StoreConfig::for_testing(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup, backed by the process environment or a fixed map.
struct Vars<'a> {
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
}

impl<'a> Vars<'a> {
    fn process() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    #[cfg(test)]
    fn from_map(map: &'a HashMap<&str, &str>) -> Self {
        Self {
            lookup: Box::new(move |key| map.get(key).map(|v| (*v).to_string())),
        }
    }

    /// Get an optional variable. Empty values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, using `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`), default false.
    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(false);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

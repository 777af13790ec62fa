//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::error::AppError;
use crate::store::{Reference, StoreError, StoreSlot};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the one-time store connection.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    slot: Arc<StoreSlot>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The slot is usually initialized before this is called; an
    /// uninitialized slot behaves like an unavailable store.
    #[must_use]
    pub fn new(config: SiteConfig, slot: Arc<StoreSlot>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, slot }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the store slot.
    #[must_use]
    pub fn slot(&self) -> &StoreSlot {
        &self.inner.slot
    }

    /// Reference to the `portfolio` node.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store never connected.
    pub fn portfolio(&self) -> Result<Reference, AppError> {
        self.inner.slot.portfolio().ok_or(AppError::StoreUnavailable)
    }

    /// Converts store failures into `AppError` under the configured
    /// redaction policy.
    pub fn store_error(&self) -> impl Fn(StoreError) -> AppError + use<> {
        let redact = self.inner.config.redact_errors;
        move |source| AppError::store(source, redact)
    }
}

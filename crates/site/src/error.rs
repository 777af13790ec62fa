//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. API handlers return `Result<T, AppError>` and every
//! error body is JSON of the form `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use portfolio_core::{CategoryError, KeyError};

use crate::store::StoreError;

/// Tag returned in place of backend messages when redaction is on.
pub const REDACTED_STORE_ERROR: &str = "store_error";

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// No admin session on a mutating route.
    #[error("unauthorized")]
    Unauthorized,

    /// The store never connected.
    #[error("firebase_unavailable")]
    StoreUnavailable,

    /// A store call failed.
    ///
    /// `redact` decides whether the client sees the backend message.
    #[error("store error: {source}")]
    Store {
        #[source]
        source: StoreError,
        redact: bool,
    },

    /// A category or id path segment is not a valid store key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A privileged collection was addressed through the generic API.
    #[error("forbidden category: {0}")]
    ReservedCategory(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// Wrap a store failure, keeping or hiding its message for the client.
    #[must_use]
    pub const fn store(source: StoreError, redact: bool) -> Self {
        Self::Store { source, redact }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidKey(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ReservedCategory(_) => StatusCode::FORBIDDEN,
            Self::Store { .. } | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `error` field of the response body.
    fn client_message(&self) -> String {
        match self {
            Self::Unauthorized => "unauthorized".to_string(),
            Self::StoreUnavailable => "firebase_unavailable".to_string(),
            Self::Store {
                redact: true,
                ..
            } => REDACTED_STORE_ERROR.to_string(),
            Self::Store { source, .. } => source.to_string(),
            Self::InvalidKey(_) => "invalid_key".to_string(),
            Self::ReservedCategory(_) => "forbidden_category".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Session(_) => "internal_error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && !matches!(self, Self::StoreUnavailable) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Reserved(name) => Self::ReservedCategory(name),
            CategoryError::InvalidKey(e) => Self::InvalidKey(e.to_string()),
        }
    }
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        Self::InvalidKey(err.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn denied() -> StoreError {
        StoreError::Status {
            status: 401,
            message: "Permission denied".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_error_message_is_exposed() {
        let (status, body) = body_of(AppError::store(denied(), false)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Permission denied"}));
    }

    #[tokio::test]
    async fn test_store_error_message_is_redacted() {
        let (_, body) = body_of(AppError::store(denied(), true)).await;
        assert_eq!(body, json!({"error": "store_error"}));
    }

    #[tokio::test]
    async fn test_fixed_tags() {
        let (status, body) = body_of(AppError::StoreUnavailable).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "firebase_unavailable");

        let (status, body) = body_of(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_category_errors() {
        let err = AppError::from(portfolio_core::Category::parse("admins").unwrap_err());
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden_category");

        let err = AppError::from(portfolio_core::Category::parse("a.b").unwrap_err());
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_key");
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("body must be a JSON object".to_string());
        assert_eq!(err.to_string(), "bad request: body must be a JSON object");
    }
}

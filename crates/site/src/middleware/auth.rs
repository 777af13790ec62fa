//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring an admin session in route handlers.
//! Handlers that take [`RequireAdminAuth`] never run for anonymous callers,
//! so no store operation happens before the check.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::session::{SessionClaims, keys};

/// Extractor that requires an authenticated admin session.
///
/// If the session is anonymous, API requests get `401` and page requests are
/// redirected to the login form.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_admin: RequireAdminAuth) -> impl IntoResponse {
///     "Hello, admin!"
/// }
/// ```
pub struct RequireAdminAuth(pub SessionClaims);

/// Error returned when an admin session is required but absent.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            )
                .into_response(),
        }
    }
}

/// Read the claims from the session, if any.
async fn session_claims(parts: &Parts) -> Option<SessionClaims> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<SessionClaims>(keys::CLAIMS)
        .await
        .ok()
        .flatten()
}

/// Whether the request targets the JSON API.
///
/// Nested routers see the path with their prefix stripped, so the original
/// URI is checked first.
fn is_api_request(parts: &Parts) -> bool {
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |original| original.0.path());
    path.starts_with("/api/")
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_claims(parts).await {
            Some(claims) if claims.admin => Ok(Self(claims)),
            _ => {
                if is_api_request(parts) {
                    Err(AuthRejection::Unauthorized)
                } else {
                    Err(AuthRejection::RedirectToLogin)
                }
            }
        }
    }
}

/// Extractor that reports whether the caller is an admin without rejecting.
pub struct OptionalAdminAuth(pub bool);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_claims(parts).await.is_some_and(|c| c.admin)))
    }
}

/// Mark the session as an authenticated admin.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CLAIMS, SessionClaims::admin()).await
}

/// Destroy the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_admin_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

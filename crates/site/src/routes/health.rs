//! Health checks.

use axum::{extract::State, http::StatusCode};

use portfolio_core::{SingletonField, StoreKey};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Reads the `profile` node, which is small, to verify store connectivity.
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Ok(portfolio) = state.portfolio() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    let Ok(profile) = StoreKey::parse(SingletonField::Profile.as_str()) else {
        return StatusCode::INTERNAL_SERVER_ERROR;
    };
    match portfolio.child(&profile).get().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

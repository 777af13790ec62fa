//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Landing page
//! GET  /certifications         - Certifications page
//!
//! # Auth
//! GET  /login                  - Login form (redirects to /admin when signed in)
//! POST /login                  - Login action (rate limited)
//! GET  /logout                 - Logout, redirect home
//!
//! # Admin (requires auth)
//! GET  /admin                  - Content editor
//!
//! # JSON API
//! GET    /api/data             - Whole portfolio tree
//! POST   /api/{category}       - Replace a singleton or add a collection entry (auth)
//! PUT    /api/{category}/{id}  - Merge fields into an entry (auth)
//! POST   /api/{category}/{id}  - Same as PUT (auth)
//! DELETE /api/{category}/{id}  - Remove an entry (auth)
//!
//! # Diagnostics
//! GET  /firebase_status        - Store configuration and live probe
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store probe)
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod diagnostics;
pub mod health;
pub mod pages;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(api::data))
        .route("/{category}", post(api::add))
        .route(
            "/{category}/{id}",
            put(api::update).post(api::update).delete(api::delete),
        )
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public pages
        .route("/", get(pages::index))
        .route("/certifications", get(pages::certifications))
        // Auth routes
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route("/logout", get(auth::logout))
        // Admin editor
        .route("/admin", get(admin::dashboard))
        // Diagnostics
        .route("/firebase_status", get(diagnostics::firebase_status))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // JSON API
        .nest("/api", api_routes())
}

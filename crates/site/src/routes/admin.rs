//! Admin editor page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use portfolio_core::SINGLETON_FIELDS;

use super::pages::load_view;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::portfolio::PortfolioView;
use crate::state::AppState;

/// Admin editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub view: PortfolioView,
    /// False when the store never connected; the editor shows a warning.
    pub store_available: bool,
    pub singleton_names: &'static [&'static str],
}

/// `GET /admin`
pub async fn dashboard(_admin: RequireAdminAuth, State(state): State<AppState>) -> impl IntoResponse {
    AdminTemplate {
        store_available: state.slot().store().is_some(),
        view: load_view(&state).await,
        singleton_names: SINGLETON_FIELDS,
    }
}

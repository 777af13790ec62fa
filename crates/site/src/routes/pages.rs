//! Public page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use serde_json::Value;
use tracing::warn;

use crate::db::content::ContentRepository;
use crate::filters;
use crate::middleware::OptionalAdminAuth;
use crate::models::portfolio::{PortfolioView, Section};
use crate::state::AppState;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: PortfolioView,
    pub is_admin: bool,
}

/// Certifications page template.
#[derive(Template, WebTemplate)]
#[template(path = "certifications.html")]
pub struct CertificationsTemplate {
    pub view: PortfolioView,
    pub certifications: Option<Section>,
    pub is_admin: bool,
}

/// Read the tree for a page.
///
/// Pages always render: an unavailable store or a failed read yields an
/// empty view.
pub async fn load_view(state: &AppState) -> PortfolioView {
    let Ok(portfolio) = state.portfolio() else {
        return PortfolioView::from_tree(&Value::Null);
    };
    match ContentRepository::new(&portfolio).tree().await {
        Ok(tree) => PortfolioView::from_tree(&tree),
        Err(e) => {
            warn!(error = %e, "Portfolio read failed, rendering empty page");
            PortfolioView::from_tree(&Value::Null)
        }
    }
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    OptionalAdminAuth(is_admin): OptionalAdminAuth,
) -> impl IntoResponse {
    IndexTemplate {
        view: load_view(&state).await,
        is_admin,
    }
}

/// `GET /certifications`
pub async fn certifications(
    State(state): State<AppState>,
    OptionalAdminAuth(is_admin): OptionalAdminAuth,
) -> impl IntoResponse {
    let view = load_view(&state).await;
    let certifications = view.section("certifications").cloned();
    CertificationsTemplate {
        view,
        certifications,
        is_admin,
    }
}

//! Login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_admin_session, set_admin_session};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(OptionalAdminAuth(is_admin): OptionalAdminAuth) -> Response {
    if is_admin {
        return Redirect::to("/admin").into_response();
    }
    LoginTemplate { error: None }.into_response()
}

/// Handle login form submission.
///
/// An unavailable store, an unknown email and a wrong password all render
/// the same error.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let failed = || {
        LoginTemplate {
            error: Some(INVALID_CREDENTIALS.to_string()),
        }
        .into_response()
    };

    let Ok(portfolio) = state.portfolio() else {
        tracing::warn!("Login attempted while the store is unavailable");
        return Ok(failed());
    };

    match AuthService::new(&portfolio)
        .login(&form.email, &form.password)
        .await
    {
        Ok(_) => {
            set_admin_session(&session).await?;
            Ok(Redirect::to("/admin").into_response())
        }
        Err(_) => Ok(failed()),
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_admin_session(&session).await?;
    Ok(Redirect::to("/"))
}

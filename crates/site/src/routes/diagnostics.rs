//! Store diagnostics.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::REDACTED_STORE_ERROR;
use crate::store::credentials::CredentialSource;
use crate::state::AppState;

/// Body of `GET /firebase_status`.
#[derive(Debug, Serialize)]
pub struct FirebaseStatus {
    pub database_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_project_id: Option<String>,
    pub db_test: DbTest,
}

/// Outcome of the live probe.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DbTest {
    Connected { ok: bool, connected: bool },
    Failed { ok: bool, error: String },
}

impl DbTest {
    fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            ok: false,
            error: error.into(),
        }
    }
}

/// `GET /firebase_status`
///
/// Never fails: every problem is reported inside `db_test`.
pub async fn firebase_status(State(state): State<AppState>) -> Json<FirebaseStatus> {
    let store = &state.config().store;
    let source = CredentialSource::resolve(store);

    let db_test = match state.portfolio() {
        Err(_) => DbTest::failed("firebase_unavailable"),
        Ok(portfolio) => match portfolio.get().await {
            Ok(_) => DbTest::Connected {
                ok: true,
                connected: true,
            },
            Err(e) if state.config().redact_errors => {
                tracing::warn!(error = %e, "Store probe failed");
                DbTest::failed(REDACTED_STORE_ERROR)
            }
            Err(e) => DbTest::failed(e.to_string()),
        },
    };

    Json(FirebaseStatus {
        database_url: store.database_url.to_string(),
        credential_source: source.as_ref().map(CredentialSource::describe),
        path_used: source
            .as_ref()
            .and_then(CredentialSource::path)
            .map(|p| p.display().to_string()),
        service_account_project_id: source.as_ref().and_then(|s| s.project_id(store)),
        db_test,
    })
}

//! JSON API handlers.
//!
//! Mutating handlers take [`RequireAdminAuth`] as their first extractor, so
//! anonymous callers are rejected before the category is parsed or the store
//! is touched.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
};
use serde_json::{Map, Value, json};
use tracing::info;

use portfolio_core::{Category, StoreKey};

use crate::db::content::{Added, ContentRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// A request body that is a JSON object.
///
/// An empty body or a literal `null` is treated as `{}`. Any other non-object
/// value is rejected with `400`.
#[derive(Debug)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parse_object(&bytes).map(Self)
    }
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(AppError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON: {e}"))),
    }
}

/// `GET /api/data`: the portfolio tree, minus reserved collections.
pub async fn data(State(state): State<AppState>) -> Result<Json<Value>> {
    let portfolio = state.portfolio()?;
    let tree = ContentRepository::new(&portfolio)
        .public_tree()
        .await
        .map_err(state.store_error())?;
    Ok(Json(tree))
}

/// `POST /api/{category}`: replace a singleton or append a collection entry.
pub async fn add(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Path(category): Path<String>,
    JsonObject(entry): JsonObject,
) -> Result<Json<Value>> {
    let category = Category::parse(&category)?;
    let portfolio = state.portfolio()?;

    let added = ContentRepository::new(&portfolio)
        .add(&category, &entry)
        .await
        .map_err(state.store_error())?;

    Ok(Json(match added {
        Added::Replaced => {
            info!(category = %category, "Singleton replaced");
            json!({"success": true})
        }
        Added::Created(id) => {
            info!(category = %category, id = %id, "Entry created");
            json!({"success": true, "id": id.as_str()})
        }
    }))
}

/// `PUT|POST /api/{category}/{id}`: merge fields into an entry.
pub async fn update(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
    JsonObject(fields): JsonObject,
) -> Result<Json<Value>> {
    let category = Category::parse(&category)?;
    let id = StoreKey::parse(&id)?;
    let portfolio = state.portfolio()?;

    ContentRepository::new(&portfolio)
        .update(&category, &id, &fields)
        .await
        .map_err(state.store_error())?;

    info!(category = %category, id = %id, "Entry updated");
    Ok(Json(json!({"success": true})))
}

/// `DELETE /api/{category}/{id}`: remove an entry.
pub async fn delete(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let category = Category::parse(&category)?;
    let id = StoreKey::parse(&id)?;
    let portfolio = state.portfolio()?;

    ContentRepository::new(&portfolio)
        .delete(&category, &id)
        .await
        .map_err(state.store_error())?;

    info!(category = %category, id = %id, "Entry deleted");
    Ok(Json(json!({"success": true})))
}

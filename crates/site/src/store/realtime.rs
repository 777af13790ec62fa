//! Firebase Realtime Database REST client.
//!
//! Every tree path maps to `{database_url}/{path}.json`. Writes ask for
//! `print=silent` so the backend does not echo the written value back.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use url::Url;

use portfolio_core::StoreKey;

use super::token::ServiceAccountTokenSource;
use super::{StoreError, StorePath, TreeStore};

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// REST client for one Realtime Database instance.
#[derive(Debug, Clone)]
pub struct RealtimeDatabase {
    client: reqwest::Client,
    base_url: Url,
    namespace: Option<String>,
    auth: Option<Arc<ServiceAccountTokenSource>>,
}

impl RealtimeDatabase {
    /// Client authenticated with a service-account token source.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url, auth: ServiceAccountTokenSource) -> Self {
        Self {
            client,
            base_url,
            namespace: None,
            auth: Some(Arc::new(auth)),
        }
    }

    /// Client that sends no credentials (public databases and tests).
    #[must_use]
    pub const fn unauthenticated(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            namespace: None,
            auth: None,
        }
    }

    /// Client for the local emulator at `host` (`localhost:9000`).
    ///
    /// The emulator serves every database from one origin and picks the
    /// instance from the `ns` query parameter, which is the first host label
    /// of the production `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidUrl` if `host` does not form a URL or the
    /// database URL has no host.
    pub fn emulator(
        client: reqwest::Client,
        host: &str,
        database_url: &Url,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(&format!("http://{host}/"))
            .map_err(|e| StoreError::InvalidUrl(format!("{host}: {e}")))?;
        let namespace = database_url
            .host_str()
            .and_then(|h| h.split('.').next())
            .filter(|label| !label.is_empty())
            .ok_or_else(|| StoreError::InvalidUrl(database_url.to_string()))?
            .to_owned();

        Ok(Self {
            client,
            base_url,
            namespace: Some(namespace),
            auth: None,
        })
    }

    /// The REST URL for `path`.
    fn endpoint(&self, path: &StorePath, silent: bool) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();

            let keys: Vec<&StoreKey> = path.segments().collect();
            match keys.split_last() {
                None => {
                    segments.push(".json");
                }
                Some((last, parents)) => {
                    segments.extend(parents.iter().map(|key| key.as_str()));
                    segments.push(&format!("{last}.json"));
                }
            }
        }

        {
            let mut query = url.query_pairs_mut();
            if let Some(ns) = &self.namespace {
                query.append_pair("ns", ns);
            }
            if silent {
                query.append_pair("print", "silent");
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        path: &StorePath,
        silent: bool,
    ) -> Result<RequestBuilder, StoreError> {
        let url = self.endpoint(path, silent)?;
        let mut builder = self.client.request(method, url);
        if let Some(auth) = &self.auth {
            let token = auth.access_token().await?;
            builder = builder.bearer_auth(token.expose_secret());
        }
        Ok(builder)
    }

    /// Send a request and map non-success statuses to `StoreError::Status`.
    async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .ok()
            .filter(|m| !m.is_empty())
            .or_else(|| Some(body.trim().to_owned()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            });

        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TreeStore for RealtimeDatabase {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &StorePath) -> Result<Value, StoreError> {
        let response = Self::send(self.request(Method::GET, path, false).await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn set(&self, path: &StorePath, value: &Value) -> Result<(), StoreError> {
        let builder = self.request(Method::PUT, path, true).await?.json(value);
        Self::send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, changes), fields(path = %path))]
    async fn update(
        &self,
        path: &StorePath,
        changes: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let builder = self.request(Method::PATCH, path, true).await?.json(changes);
        Self::send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn push(&self, path: &StorePath, value: &Value) -> Result<StoreKey, StoreError> {
        let builder = self.request(Method::POST, path, false).await?.json(value);
        let response = Self::send(builder).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(StoreError::UnexpectedResponse(
                "push returned no key".to_string(),
            ));
        }

        let body: PushResponse = response.json().await?;
        let key = StoreKey::parse(&body.name)?;
        debug!(key = %key, "Pushed child");
        Ok(key)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        Self::send(self.request(Method::DELETE, path, true).await?).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("emulator {} (ns={ns})", self.base_url),
            None => self.base_url.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::super::token::tests::test_account;
    use super::*;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    fn client_for(server: &MockServer) -> RealtimeDatabase {
        RealtimeDatabase::unauthenticated(
            reqwest::Client::new(),
            Url::parse(&server.url("/")).unwrap(),
        )
    }

    #[test]
    fn test_endpoint_shapes() {
        let db = RealtimeDatabase::unauthenticated(
            reqwest::Client::new(),
            Url::parse("https://demo-default-rtdb.firebaseio.com/").unwrap(),
        );

        assert_eq!(
            db.endpoint(&path("portfolio/profile"), false).unwrap().as_str(),
            "https://demo-default-rtdb.firebaseio.com/portfolio/profile.json"
        );
        assert_eq!(
            db.endpoint(&StorePath::root(), true).unwrap().as_str(),
            "https://demo-default-rtdb.firebaseio.com/.json?print=silent"
        );
        assert_eq!(
            db.endpoint(&path("portfolio/side projects"), false)
                .unwrap()
                .as_str(),
            "https://demo-default-rtdb.firebaseio.com/portfolio/side%20projects.json"
        );
    }

    #[test]
    fn test_emulator_namespace() {
        let db = RealtimeDatabase::emulator(
            reqwest::Client::new(),
            "localhost:9000",
            &Url::parse("https://portfolio-madesh-default-rtdb.asia-southeast1.firebasedatabase.app/")
                .unwrap(),
        )
        .unwrap();

        assert_eq!(
            db.endpoint(&path("portfolio"), false).unwrap().as_str(),
            "http://localhost:9000/portfolio.json?ns=portfolio-madesh-default-rtdb"
        );
        assert!(db.describe().contains("ns=portfolio-madesh-default-rtdb"));
    }

    #[tokio::test]
    async fn test_get_value_and_null() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/portfolio/profile.json");
                then.status(200).json_body(json!({"name": "Madesh"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/portfolio/missing.json");
                then.status(200).body("null");
            })
            .await;

        let db = client_for(&server);
        assert_eq!(
            db.get(&path("portfolio/profile")).await.unwrap(),
            json!({"name": "Madesh"})
        );
        assert_eq!(db.get(&path("portfolio/missing")).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_set_is_silent_put() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/portfolio/socials.json")
                    .query_param("print", "silent")
                    .json_body(json!({"github": "https://github.com/m"}));
                then.status(204);
            })
            .await;

        client_for(&server)
            .set(
                &path("portfolio/socials"),
                &json!({"github": "https://github.com/m"}),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_is_patch() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("PATCH")
                    .path("/portfolio/projects/p1.json")
                    .json_body(json!({"title": "New"}));
                then.status(204);
            })
            .await;

        let changes = json!({"title": "New"}).as_object().unwrap().clone();
        client_for(&server)
            .update(&path("portfolio/projects/p1"), &changes)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_push_returns_generated_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/portfolio/projects.json");
                then.status(200).json_body(json!({"name": "-NqXf3kz0aBcDeFgHiJk"}));
            })
            .await;

        let key = client_for(&server)
            .push(&path("portfolio/projects"), &json!({"title": "T"}))
            .await
            .unwrap();
        assert_eq!(key.as_str(), "-NqXf3kz0aBcDeFgHiJk");
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/portfolio/projects/p1.json")
                    .query_param("print", "silent");
                then.status(200).body("null");
            })
            .await;

        client_for(&server)
            .delete(&path("portfolio/projects/p1"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_becomes_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/portfolio.json");
                then.status(401)
                    .json_body(json!({"error": "Permission denied"}));
            })
            .await;

        match client_for(&server).get(&path("portfolio")).await {
            Err(err @ StoreError::Status { status: 401, .. }) => {
                assert_eq!(err.to_string(), "Permission denied");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/portfolio.json");
                then.status(500).body("upstream exploded");
            })
            .await;

        let err = client_for(&server).get(&path("portfolio")).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[tokio::test]
    async fn test_authenticated_requests_send_bearer_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({
                    "access_token": "ya29.abc",
                    "expires_in": 3600
                }));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/portfolio.json")
                    .header("authorization", "Bearer ya29.abc");
                then.status(200).json_body(json!({"profile": {"name": "M"}}));
            })
            .await;

        let source = ServiceAccountTokenSource::new(
            reqwest::Client::new(),
            &test_account(server.url("/token")),
        )
        .unwrap();
        let db = RealtimeDatabase::new(
            reqwest::Client::new(),
            Url::parse(&server.url("/")).unwrap(),
            source,
        );

        let value = db.get(&path("portfolio")).await.unwrap();
        assert_eq!(value["profile"]["name"], "M");
        data.assert_async().await;
    }
}

//! Integration tests for the portfolio site.
//!
//! Each test starts the real router on an ephemeral local port, backed by an
//! in-memory tree, and talks to it over HTTP.
//!
//! ```bash
//! cargo test -p portfolio-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_crud` - JSON API create/read/update/delete as an admin
//! - `auth_flow` - login, logout, and rejection of anonymous mutations
//! - `availability` - behavior when the store never connected
//! - `pages` - public page rendering

use std::net::SocketAddr;
use std::sync::Arc;

use portfolio_site::config::SiteConfig;
use portfolio_site::state::AppState;
use portfolio_site::store::{MemoryTree, StoreSlot, TreeStore};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};

/// Email of the seeded admin.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Password of the seeded admin.
pub const ADMIN_PASSWORD: &str = "correct horse";

/// PBKDF2 hash of [`ADMIN_PASSWORD`], in the legacy salted format.
pub const ADMIN_PASSWORD_HASH: &str = "pbkdf2:sha256:1000$8fKq2LmZ$f4707d5ecb7eb03dd3d13142aaee0f338d036947a42c07693ab048efbf2b49b6";

/// A running server and a client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    /// The backing tree, for asserting on store state directly.
    pub tree: Option<Arc<MemoryTree>>,
}

impl TestContext {
    /// Serve a tree whose `portfolio` node is `portfolio`, plus the test admin.
    pub async fn with_portfolio(mut portfolio: Value) -> Self {
        if let Value::Object(map) = &mut portfolio {
            map.entry("admins").or_insert_with(|| {
                json!({"-admin": {"email": ADMIN_EMAIL, "password_hash": ADMIN_PASSWORD_HASH}})
            });
        }
        let tree = Arc::new(MemoryTree::with_root(json!({ "portfolio": portfolio })));
        let store: Arc<dyn TreeStore> = tree.clone();
        let slot = StoreSlot::with_store(store);
        Self::serve(slot, Some(tree)).await
    }

    /// Serve the test admin and nothing else.
    pub async fn new() -> Self {
        Self::with_portfolio(json!({})).await
    }

    /// Serve with a store that failed to connect.
    pub async fn unavailable() -> Self {
        Self::serve(StoreSlot::unavailable(), None).await
    }

    async fn serve(slot: StoreSlot, tree: Option<Arc<MemoryTree>>) -> Self {
        let state = AppState::new(SiteConfig::for_testing(), Arc::new(slot));
        let app = portfolio_site::build_app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
            tree,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Submit the login form.
    pub async fn post_login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("Login request failed")
    }

    /// Log in as the seeded admin and return the session cookie.
    pub async fn login(&self) -> Session {
        let response = self.post_login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        Session::from_response(&response).expect("Login did not set a session cookie")
    }

    /// The current `portfolio` node in the backing tree.
    pub async fn stored(&self) -> Value {
        let tree = self.tree.as_ref().expect("No backing tree");
        tree.snapshot().await["portfolio"].clone()
    }
}

/// A session cookie captured from a response.
#[derive(Debug, Clone)]
pub struct Session {
    cookie: String,
}

impl Session {
    /// The `name=value` pair from the response's `Set-Cookie` header.
    pub fn from_response(response: &Response) -> Option<Self> {
        let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
        let pair = header.split(';').next()?.trim();
        Some(Self {
            cookie: pair.to_owned(),
        })
    }

    /// Attach the cookie to a request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(COOKIE, &self.cookie)
    }
}

//! Service-account OAuth access tokens.
//!
//! A signed RS256 JWT assertion is exchanged at the account's `token_uri` for
//! a short-lived bearer token. Tokens are cached until shortly before they
//! expire.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::credentials::ServiceAccount;

/// OAuth scopes required for Realtime Database REST access.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/firebase.database",
    "https://www.googleapis.com/auth/userinfo.email",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion. Google caps this at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Errors that can occur while obtaining an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The private key is not a usable RSA PEM key.
    #[error("invalid service account private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    /// Signing the assertion failed.
    #[error("failed to sign token assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint refused the assertion.
    #[error("token endpoint returned {status}: {body}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Response body.
        body: String,
    },
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Still usable for at least another minute.
    fn is_valid(&self) -> bool {
        self.expires_at > Utc::now() + Duration::seconds(60)
    }
}

/// Issues bearer tokens for one service account.
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    client_email: String,
    private_key_id: Option<String>,
    key: EncodingKey,
    token_uri: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Build a token source, validating the private key up front.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the key cannot be parsed.
    pub fn new(client: reqwest::Client, account: &ServiceAccount) -> Result<Self, TokenError> {
        let key = EncodingKey::from_rsa_pem(account.private_key.expose_secret().as_bytes())
            .map_err(TokenError::InvalidKey)?;

        Ok(Self {
            client,
            client_email: account.client_email.clone(),
            private_key_id: account.private_key_id.clone(),
            key,
            token_uri: account.token_uri.clone(),
            cached: RwLock::new(None),
        })
    }

    /// The service account this source issues tokens for.
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Return a valid access token, fetching a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if signing or the token exchange fails.
    pub async fn access_token(&self) -> Result<SecretString, TokenError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref()
                && token.is_valid()
            {
                return Ok(token.token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref()
            && token.is_valid()
        {
            return Ok(token.token.clone());
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    #[instrument(skip(self), fields(client_email = %self.client_email))]
    async fn fetch(&self) -> Result<CachedToken, TokenError> {
        let assertion = self.assertion(Utc::now())?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = response.json().await?;
        debug!(expires_in = body.expires_in, "Obtained access token");

        Ok(CachedToken {
            token: SecretString::from(body.access_token),
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.private_key_id);

        encode(&header, &claims, &self.key).map_err(TokenError::Signing)
    }
}

impl fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use httpmock::prelude::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    use super::*;

    pub(crate) const TEST_PRIVATE_KEY: &str = include_str!("testdata/service_account_key.pem");

    pub(crate) fn test_account(token_uri: String) -> ServiceAccount {
        ServiceAccount {
            project_id: Some("portfolio-test".to_string()),
            private_key_id: Some("key-1".to_string()),
            private_key: SecretString::from(TEST_PRIVATE_KEY.to_string()),
            client_email: "svc@portfolio-test.iam.gserviceaccount.com".to_string(),
            token_uri,
        }
    }

    #[test]
    fn test_rejects_invalid_key() {
        let mut account = test_account("https://oauth2.googleapis.com/token".to_string());
        account.private_key = SecretString::from("not a key".to_string());
        assert!(matches!(
            ServiceAccountTokenSource::new(reqwest::Client::new(), &account),
            Err(TokenError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_assertion_claims() {
        let account = test_account("https://oauth2.example.test/token".to_string());
        let source = ServiceAccountTokenSource::new(reqwest::Client::new(), &account).unwrap();
        let jwt = source.assertion(Utc::now()).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));

        let public_key = include_str!("testdata/service_account_key.pub.pem");
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.example.test/token"]);
        let data = decode::<serde_json::Value>(
            &jwt,
            &DecodingKey::from_rsa_pem(public_key.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims["iss"], account.client_email);
        assert_eq!(data.claims["scope"], SCOPES.join(" "));
        let iat = data.claims["iat"].as_i64().unwrap();
        let exp = data.claims["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, ASSERTION_LIFETIME_SECS);
    }

    #[tokio::test]
    async fn test_access_token_is_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "ya29.test-token",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }));
            })
            .await;

        let account = test_account(server.url("/token"));
        let source = ServiceAccountTokenSource::new(reqwest::Client::new(), &account).unwrap();

        let first = source.access_token().await.unwrap();
        let second = source.access_token().await.unwrap();

        assert_eq!(first.expose_secret(), "ya29.test-token");
        assert_eq!(second.expose_secret(), "ya29.test-token");
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_nearly_expired_token_is_refreshed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "short-lived",
                    "expires_in": 30
                }));
            })
            .await;

        let account = test_account(server.url("/token"));
        let source = ServiceAccountTokenSource::new(reqwest::Client::new(), &account).unwrap();

        source.access_token().await.unwrap();
        source.access_token().await.unwrap();
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_rejected_exchange() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400).body(r#"{"error":"invalid_grant"}"#);
            })
            .await;

        let account = test_account(server.url("/token"));
        let source = ServiceAccountTokenSource::new(reqwest::Client::new(), &account).unwrap();

        match source.access_token().await {
            Err(TokenError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}

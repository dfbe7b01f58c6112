//! Bearer token acquisition.
//!
//! A [`TokenProvider`] mints access tokens; [`Credentials`] holds the current
//! one behind an async read-write lock and renews it shortly before expiry.
//!
//! The service-account flow signs an RS256 JWT assertion with the key file's
//! private key and exchanges it at the key's token endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use mea::rwlock::RwLock;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

use nichedoc_core::error::{DocumentStoreError, DocumentStoreResult};

use crate::config::{CredentialsSource, FirestoreConfig};

/// OAuth scope granting document reads and writes.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account JSON key this crate uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> DocumentStoreResult<Self> {
        serde_json::from_str(json).map_err(|err| {
            DocumentStoreError::Unauthenticated(format!("malformed service-account key: {err}"))
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> DocumentStoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            DocumentStoreError::Unauthenticated(format!(
                "cannot read service-account key {}: {err}",
                path.display()
            ))
        })?;

        Self::from_json(&json)
    }
}

/// A bearer token and the moment it stops being valid.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    /// `None` for tokens that never expire, such as the emulator token.
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// Whether the token expires within `margin` of `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, margin: ChronoDuration) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at - margin <= now)
    }
}

/// Source of access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// Acquires a fresh token.
    async fn fetch_token(&self, client: &reqwest::Client) -> DocumentStoreResult<AccessToken>;
}

/// Hands out the same token forever.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self, _client: &reqwest::Client) -> DocumentStoreResult<AccessToken> {
        Ok(AccessToken { token: self.token.clone(), expires_at: None })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges signed JWT assertions for access tokens.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scope: String,
}

impl fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenProvider {
    /// Parses the private key once so a broken key fails here rather than on
    /// every token request.
    pub fn new(key: ServiceAccountKey) -> DocumentStoreResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|err| {
            DocumentStoreError::Unauthenticated(format!("invalid service-account private key: {err}"))
        })?;

        Ok(Self { key, signing_key, scope: DATASTORE_SCOPE.to_string() })
    }

    pub fn from_file(path: impl AsRef<Path>) -> DocumentStoreResult<Self> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Signs the assertion presented to the token endpoint.
    pub fn assertion(&self, now: DateTime<Utc>) -> DocumentStoreResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|err| DocumentStoreError::Unauthenticated(format!("cannot sign assertion: {err}")))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn fetch_token(&self, client: &reqwest::Client) -> DocumentStoreResult<AccessToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|err| DocumentStoreError::Unauthenticated(format!("token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocumentStoreError::Unauthenticated(format!(
                "token endpoint answered {status}: {body}"
            )));
        }

        let body = response.json::<TokenResponse>().await.map_err(|err| {
            DocumentStoreError::Unauthenticated(format!("unreadable token response: {err}"))
        })?;

        Ok(AccessToken {
            token: body.access_token,
            expires_at: body
                .expires_in
                .map(|seconds| now + ChronoDuration::seconds(seconds)),
        })
    }
}

#[derive(Debug)]
enum TokenState {
    Ready(AccessToken),
    /// Initial acquisition failed; nothing will be retried.
    Unavailable(String),
}

/// The client's token cache.
#[derive(Debug)]
pub struct Credentials {
    provider: Option<Box<dyn TokenProvider>>,
    state: RwLock<TokenState>,
    refresh: bool,
    margin: ChronoDuration,
}

impl Credentials {
    /// Acquires the first token.
    ///
    /// Never fails: when the key cannot be loaded or the exchange fails, the
    /// credentials stay unavailable and every [`bearer`](Self::bearer) call
    /// reports [`DocumentStoreError::Unauthenticated`] without touching the
    /// network.
    pub async fn initialize(config: &FirestoreConfig, client: &reqwest::Client) -> Self {
        let provider: DocumentStoreResult<Box<dyn TokenProvider>> = match &config.credentials {
            CredentialsSource::File(path) => ServiceAccountTokenProvider::from_file(path)
                .map(|provider| Box::new(provider) as Box<dyn TokenProvider>),
            CredentialsSource::Static(token) => Ok(Box::new(StaticTokenProvider::new(token.as_str()))),
            CredentialsSource::None => Err(DocumentStoreError::Unauthenticated(
                "no credentials configured".to_string(),
            )),
        };

        let provider = match provider {
            Ok(provider) => provider,
            Err(err) => return Self::unavailable(config, err),
        };

        Self::with_provider(provider, config, client).await
    }

    /// Acquires the first token from an explicit provider.
    pub async fn with_provider(
        provider: Box<dyn TokenProvider>,
        config: &FirestoreConfig,
        client: &reqwest::Client,
    ) -> Self {
        match provider.fetch_token(client).await {
            Ok(token) => {
                tracing::debug!(expires_at = ?token.expires_at, "Acquired Firestore access token");
                Self {
                    provider: Some(provider),
                    state: RwLock::new(TokenState::Ready(token)),
                    refresh: config.refresh_tokens,
                    margin: margin(config),
                }
            }
            Err(err) => Self::unavailable(config, err),
        }
    }

    fn unavailable(config: &FirestoreConfig, err: DocumentStoreError) -> Self {
        tracing::error!(error = %err, "Firestore credentials unavailable");

        Self {
            provider: None,
            state: RwLock::new(TokenState::Unavailable(err.to_string())),
            refresh: config.refresh_tokens,
            margin: margin(config),
        }
    }

    /// Whether a token was ever acquired.
    pub async fn is_available(&self) -> bool {
        matches!(*self.state.read().await, TokenState::Ready(_))
    }

    /// Returns a usable bearer token, renewing a stale one first.
    pub async fn bearer(&self, client: &reqwest::Client) -> DocumentStoreResult<String> {
        {
            let state = self.state.read().await;
            match &*state {
                TokenState::Unavailable(reason) => {
                    return Err(DocumentStoreError::Unauthenticated(reason.clone()));
                }
                TokenState::Ready(token) if !self.refresh || !token.is_stale(Utc::now(), self.margin) => {
                    return Ok(token.token.clone());
                }
                TokenState::Ready(_) => {}
            }
        }

        let Some(provider) = &self.provider else {
            return Err(DocumentStoreError::Unauthenticated("no token provider".to_string()));
        };

        let mut state = self.state.write().await;
        if let TokenState::Ready(token) = &*state {
            if !token.is_stale(Utc::now(), self.margin) {
                return Ok(token.token.clone());
            }
        }

        match provider.fetch_token(client).await {
            Ok(token) => {
                tracing::debug!(expires_at = ?token.expires_at, "Renewed Firestore access token");
                let bearer = token.token.clone();
                *state = TokenState::Ready(token);
                Ok(bearer)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to renew Firestore access token");
                Err(err)
            }
        }
    }
}

fn margin(config: &FirestoreConfig) -> ChronoDuration {
    ChronoDuration::from_std(config.refresh_margin).unwrap_or_else(|_| ChronoDuration::seconds(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_respects_margin() {
        let now = Utc::now();
        let margin = ChronoDuration::seconds(60);
        let token = |secs| AccessToken {
            token: "t".into(),
            expires_at: Some(now + ChronoDuration::seconds(secs)),
        };

        assert!(token(30).is_stale(now, margin));
        assert!(!token(3600).is_stale(now, margin));
        assert!(!AccessToken { token: "t".into(), expires_at: None }.is_stale(now, margin));
    }

    #[test]
    fn key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{ "client_email": "sa@demo.iam.gserviceaccount.com", "private_key": "pem" }"#,
        )
        .unwrap();

        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(key.private_key_id.is_none());
    }

    #[test]
    fn rejects_unparseable_private_key() {
        let key = ServiceAccountKey::from_json(
            r#"{ "client_email": "sa@demo", "private_key": "not a pem" }"#,
        )
        .unwrap();

        let err = ServiceAccountTokenProvider::new(key).unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[tokio::test]
    async fn missing_key_file_leaves_credentials_unavailable() {
        let config = FirestoreConfig::new("demo").credentials_file("/nonexistent/sa.json");
        let client = reqwest::Client::new();
        let credentials = Credentials::initialize(&config, &client).await;

        assert!(!credentials.is_available().await);
        assert!(credentials.bearer(&client).await.unwrap_err().is_unauthenticated());
    }

    #[tokio::test]
    async fn static_token_is_served_as_is() {
        let config = FirestoreConfig::new("demo").static_token("owner");
        let client = reqwest::Client::new();
        let credentials = Credentials::initialize(&config, &client).await;

        assert_eq!(credentials.bearer(&client).await.unwrap(), "owner");
    }
}

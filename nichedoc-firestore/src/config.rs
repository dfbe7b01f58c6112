//! Firestore connection configuration.

use reqwest::Url;
use std::{path::PathBuf, time::Duration};

use nichedoc_core::error::{DocumentStoreError, DocumentStoreResult};

/// Public REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";
/// Bearer token the local emulator accepts.
pub const EMULATOR_TOKEN: &str = "owner";

/// Where the client gets its bearer token from.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialsSource {
    /// Service-account JSON key file.
    File(PathBuf),
    /// Fixed token, for the emulator and tests.
    Static(String),
    /// No credentials; every operation fails as unauthenticated.
    None,
}

/// Configuration for [`FirestoreStore`](crate::store::FirestoreStore).
///
/// # Example
///
/// ```ignore
/// let config = FirestoreConfig::new("my-project")
///     .credentials_file("storage/firebase/service-account.json")
///     .timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project that owns the database.
    pub project_id: String,
    /// Database name inside the project.
    pub database: String,
    /// REST endpoint including the API version, without a trailing slash.
    pub endpoint: String,
    /// Token source.
    pub credentials: CredentialsSource,
    /// Total request timeout.
    pub timeout: Duration,
    /// Re-acquire the token when it is about to expire.
    pub refresh_tokens: bool,
    /// How long before expiry a token counts as stale.
    pub refresh_margin: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: CredentialsSource::None,
            timeout: Duration::from_secs(30),
            refresh_tokens: true,
            refresh_margin: Duration::from_secs(60),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// See [`from_lookup`](Self::from_lookup) for the variables consulted.
    pub fn from_env() -> DocumentStoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    ///
    /// - `FIRESTORE_PROJECT_ID`, falling back to `GOOGLE_CLOUD_PROJECT` (required)
    /// - `FIRESTORE_DATABASE`
    /// - `GOOGLE_APPLICATION_CREDENTIALS`: path to the service-account key
    /// - `FIRESTORE_EMULATOR_HOST`: `host:port` of a local emulator; wins over
    ///   the key file and switches to plain HTTP with the emulator token
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DocumentStoreResult<Self> {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let project_id = present("FIRESTORE_PROJECT_ID")
            .or_else(|| present("GOOGLE_CLOUD_PROJECT"))
            .ok_or_else(|| {
                DocumentStoreError::Configuration(
                    "FIRESTORE_PROJECT_ID or GOOGLE_CLOUD_PROJECT must be set".to_string(),
                )
            })?;

        let mut config = Self::new(project_id);

        if let Some(database) = present("FIRESTORE_DATABASE") {
            config = config.database(database);
        }
        if let Some(path) = present("GOOGLE_APPLICATION_CREDENTIALS") {
            config = config.credentials_file(path);
        }
        if let Some(host) = present("FIRESTORE_EMULATOR_HOST") {
            config = config.emulator(&host);
        }

        Ok(config)
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the REST endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a service-account key file
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials = CredentialsSource::File(path.into());
        self
    }

    /// Use a fixed bearer token
    pub fn static_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = CredentialsSource::Static(token.into());
        self
    }

    /// Point at a local emulator listening on `host:port`.
    pub fn emulator(self, host: &str) -> Self {
        self.endpoint(format!("http://{}/v1", host.trim_end_matches('/')))
            .static_token(EMULATOR_TOKEN)
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn refresh_tokens(mut self, refresh: bool) -> Self {
        self.refresh_tokens = refresh;
        self
    }

    pub fn refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// `{endpoint}/projects/{project}/databases/{database}/documents`
    pub fn documents_url(&self) -> DocumentStoreResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|err| {
            DocumentStoreError::Configuration(format!("invalid endpoint `{}`: {err}", self.endpoint))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                DocumentStoreError::Configuration(format!(
                    "endpoint `{}` cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["projects", &self.project_id, "databases", &self.database, "documents"]);

        Ok(url)
    }
}

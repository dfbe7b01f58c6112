//! Firestore REST backend.
//!
//! Each operation is one authenticated request against
//! `{endpoint}/projects/{project}/databases/{database}/documents`. Nothing is
//! batched, retried or cached apart from the bearer token.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Value as JsonValue, json};

use nichedoc_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
    value::Fields,
};

use crate::{
    auth::{Credentials, TokenProvider},
    codec::{decode_document, encode_fields, quote_field_path},
    config::FirestoreConfig,
    query::structured_query,
};

/// Document store client talking to Firestore over REST.
///
/// Build one per process with [`FirestoreStore::builder`] and share it. When
/// the credentials cannot be loaded the store is still built, and every
/// operation fails with
/// [`Unauthenticated`](DocumentStoreError::Unauthenticated) without a request.
#[derive(Debug)]
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
    credentials: Credentials,
    documents_url: Url,
}

impl FirestoreStore {
    pub fn builder(config: FirestoreConfig) -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::new(config)
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// Whether a bearer token was acquired at construction.
    pub async fn is_authenticated(&self) -> bool {
        self.credentials.is_available().await
    }

    fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection);
        }
        url
    }

    fn document_url(&self, collection: &str, id: &str) -> Url {
        let mut url = self.collection_url(collection);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    fn run_query_url(&self) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop().push("documents:runQuery");
        }
        url
    }

    /// Sends an authenticated request and turns non-success statuses into
    /// [`DocumentStoreError::Rejected`].
    async fn send(&self, request: RequestBuilder) -> DocumentStoreResult<Response> {
        let bearer = self.credentials.bearer(&self.client).await?;

        let response = request
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|err| DocumentStoreError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DocumentStoreError::Rejected { status: status.as_u16(), message: error_message(&body) })
    }

    async fn send_json(&self, request: RequestBuilder) -> DocumentStoreResult<JsonValue> {
        self.send(request)
            .await?
            .json::<JsonValue>()
            .await
            .map_err(|err| DocumentStoreError::Transport(format!("unreadable response body: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "Firestore request");
        self.client.request(method, url)
    }
}

/// Pulls `error.message` out of a Firestore error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl StoreBackend for FirestoreStore {
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        let body = json!({ "fields": encode_fields(&fields) });

        let request = match id {
            Some(id) => self.request(Method::PATCH, self.document_url(collection, id)),
            None => self.request(Method::POST, self.collection_url(collection)),
        };

        decode_document(&self.send_json(request.json(&body)).await?)
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        let request = self.request(Method::GET, self.document_url(collection, id));

        match self.send_json(request).await {
            Ok(wire) => decode_document(&wire).map(Some),
            Err(DocumentStoreError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        // pageSize=0 asks the server for its default page size.
        if limit == 0 {
            return Ok(vec![]);
        }

        let mut url = self.collection_url(collection);
        url.query_pairs_mut().append_pair("pageSize", &limit.to_string());

        let wire = self.send_json(self.request(Method::GET, url)).await?;

        wire.get("documents")
            .and_then(JsonValue::as_array)
            .map(|documents| documents.iter().take(limit).map(decode_document).collect())
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        // An empty mask would replace the whole document.
        if fields.is_empty() {
            return match self.get_document(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string())),
            };
        }

        let mut url = self.document_url(collection, id);
        {
            let mut query = url.query_pairs_mut();
            for field in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &quote_field_path(field));
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let body = json!({ "fields": encode_fields(&fields) });
        self.send(self.request(Method::PATCH, url).json(&body)).await?;

        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        self.send(self.request(Method::DELETE, self.document_url(collection, id)))
            .await?;

        Ok(())
    }

    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        if query.limit == 0 {
            return Ok(vec![]);
        }

        let body = structured_query(collection, &query)?;
        let wire = self
            .send_json(self.request(Method::POST, self.run_query_url()).json(&body))
            .await?;

        let entries = wire.as_array().map(Vec::as_slice).unwrap_or_default();

        entries
            .iter()
            .filter_map(|entry| entry.get("document"))
            .take(query.limit)
            .map(decode_document)
            .collect()
    }
}

/// Builder for [`FirestoreStore`].
///
/// ```ignore
/// let store = FirestoreStore::builder(FirestoreConfig::from_env()?).build().await?;
/// ```
pub struct FirestoreStoreBuilder {
    config: FirestoreConfig,
    token_provider: Option<Box<dyn TokenProvider>>,
}

impl FirestoreStoreBuilder {
    pub fn new(config: FirestoreConfig) -> Self {
        Self { config, token_provider: None }
    }

    /// Uses `provider` instead of the configured credentials source.
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Box::new(provider));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for FirestoreStoreBuilder {
    type Backend = FirestoreStore;

    /// Builds the HTTP client and acquires the first token.
    ///
    /// Only a malformed endpoint or an HTTP client that cannot be built fail
    /// here; credential problems surface on each operation instead.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let documents_url = self.config.documents_url()?;

        let client = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(format!("nichedoc/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| DocumentStoreError::Initialization(err.to_string()))?;

        let credentials = match self.token_provider {
            Some(provider) => Credentials::with_provider(provider, &self.config, &client).await,
            None => Credentials::initialize(&self.config, &client).await,
        };

        tracing::info!(
            project = %self.config.project_id,
            database = %self.config.database,
            endpoint = %self.config.endpoint,
            "Firestore store ready"
        );

        Ok(FirestoreStore { client, config: self.config, credentials, documents_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_firestore_error_messages() {
        let body = r#"{"error":{"code":404,"message":"No document to update","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "No document to update");
        assert_eq!(error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[tokio::test]
    async fn builds_resource_urls() {
        let store = FirestoreStore::builder(FirestoreConfig::new("demo").static_token("t"))
            .build()
            .await
            .unwrap();

        let base = "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents";
        assert_eq!(store.collection_url("skills").as_str(), format!("{base}/skills"));
        assert_eq!(store.document_url("skills", "a b").as_str(), format!("{base}/skills/a%20b"));
        assert_eq!(store.run_query_url().as_str(), format!("{base}:runQuery"));
    }
}

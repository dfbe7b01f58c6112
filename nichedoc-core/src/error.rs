//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! The legacy fail-soft adapters on [`DocumentStore`](crate::store::DocumentStore)
//! collapse these errors into `None`, `false` or an empty vec after logging them.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The client holds no usable bearer token, either because acquisition failed
    /// at construction or because a renewal failed.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    /// Connection-level failure or an unreadable response body.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The remote store answered with a non-success status.
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the store.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A collection name, document ID or document body is malformed.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The query cannot be expressed by the backend.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Serialization/deserialization error when converting between native values and records.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Missing or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Returns `true` when the error means "the document does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::DocumentNotFound(..)
                | DocumentStoreError::Rejected { status: 404, .. }
        )
    }

    /// Returns `true` when the error comes from missing or rejected credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::Unauthenticated(_)
                | DocumentStoreError::Rejected { status: 401 | 403, .. }
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

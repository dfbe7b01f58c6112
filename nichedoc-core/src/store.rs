//! Main document store interface.
//!
//! [`DocumentStore`] wraps one backend and exposes the six document operations
//! in two flavours:
//!
//! - the result API (`try_create`, `try_read`, `try_read_all`, `try_update`,
//!   `try_delete`, `try_query`) that reports every failure as a
//!   [`DocumentStoreError`](crate::error::DocumentStoreError);
//! - the fail-soft API (`create`, `read`, `read_all`, `update`, `delete`,
//!   `query`) that logs the failure and hands back `None`, `false` or an empty
//!   vec, for callers that render "nothing" instead of an error page.
//!
//! A store is built once per process and shared by reference.
//!
//! # Example
//!
//! ```ignore
//! use nichedoc::prelude::*;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let skill = store.create("skills", fields! { "name" => "Python" }, None).await;
//! let same = store.read("skills", skill.unwrap().id()).await;
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::{Collection, TypedCollection},
    document::{Document, Record},
    error::DocumentStoreResult,
    query::{DEFAULT_LIMIT, Query},
    value::{Fields, Value},
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type. Use
///   `DocumentStore<Box<dyn DynStoreBackend>>` (see [`DocumentStore::into_dyn`])
///   when the backend is picked at runtime.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

/// A store whose backend was selected at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn DynStoreBackend>>;

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets an untyped collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Gets a typed collection for the specified record type.
    ///
    /// The collection name comes from the record's `collection_name()`.
    pub fn typed_collection<'a, R: Record>(&'a self) -> TypedCollection<'a, B, R> {
        TypedCollection::new(R::collection_name().to_string(), &self.backend)
    }

    /// Creates a document, optionally under a caller-chosen ID.
    ///
    /// With an ID the document at that path is created or fully replaced.
    pub async fn try_create(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        self.collection(collection).create(fields, id).await
    }

    /// Reads one document. A missing document is `Ok(None)`.
    pub async fn try_read(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        self.collection(collection).get(id).await
    }

    /// Reads one page of at most `limit` documents.
    pub async fn try_read_all(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        self.collection(collection).list(limit).await
    }

    /// Merges `fields` into an existing document.
    pub async fn try_update(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        self.collection(collection).update(id, fields).await
    }

    pub async fn try_delete(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        self.collection(collection).delete(id).await
    }

    /// Runs an equality query.
    pub async fn try_query(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.collection(collection).query(query).await
    }

    /// Creates a document, returning `None` on any failure.
    pub async fn create(&self, collection: &str, fields: Fields, id: Option<&str>) -> Option<Document> {
        match self.try_create(collection, fields, id).await {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::error!(collection, id, error = %err, "Failed to create document");
                None
            }
        }
    }

    /// Reads one document, returning `None` when it is missing or on any failure.
    pub async fn read(&self, collection: &str, id: &str) -> Option<Document> {
        match self.try_read(collection, id).await {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(collection, id, error = %err, "Failed to read document");
                None
            }
        }
    }

    /// Reads at most `limit` documents, returning an empty vec on any failure.
    pub async fn read_all(&self, collection: &str, limit: usize) -> Vec<Document> {
        match self.try_read_all(collection, limit).await {
            Ok(documents) => documents,
            Err(err) => {
                tracing::error!(collection, limit, error = %err, "Failed to read documents");
                Vec::new()
            }
        }
    }

    /// Reads at most [`DEFAULT_LIMIT`] documents.
    pub async fn read_all_default(&self, collection: &str) -> Vec<Document> {
        self.read_all(collection, DEFAULT_LIMIT).await
    }

    /// Patches a document, returning whether the update went through.
    pub async fn update(&self, collection: &str, id: &str, fields: Fields) -> bool {
        match self.try_update(collection, id, fields).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(collection, id, error = %err, "Failed to update document");
                false
            }
        }
    }

    /// Deletes a document, returning whether the delete went through.
    pub async fn delete(&self, collection: &str, id: &str) -> bool {
        match self.try_delete(collection, id).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(collection, id, error = %err, "Failed to delete document");
                false
            }
        }
    }

    /// Returns documents whose fields equal every given value, at most `limit`
    /// of them. An empty condition set behaves like [`read_all`](Self::read_all).
    pub async fn query<I, K>(&self, collection: &str, where_equals: I, limit: usize) -> Vec<Document>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let query = Query::where_equals(where_equals).with_limit(limit);

        match self.try_query(collection, query).await {
            Ok(documents) => documents,
            Err(err) => {
                tracing::error!(collection, limit, error = %err, "Failed to query documents");
                Vec::new()
            }
        }
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}

impl<B: StoreBackend + 'static> DocumentStore<B> {
    /// Erases the backend type.
    pub fn into_dyn(self) -> DynDocumentStore {
        DocumentStore::new(Box::new(self.backend))
    }
}

impl DynDocumentStore {
    /// Returns the concrete backend when it is a `T`.
    pub fn downcast_backend<T: StoreBackend + 'static>(&self) -> Option<&T> {
        DynStoreBackend::as_any(&*self.backend).downcast_ref::<T>()
    }
}

//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait is the seam between the generic store API and a
//! concrete remote or local store. Every method is a single round trip with
//! explicit [`DocumentStoreResult`] errors; the fail-soft behaviour callers rely
//! on lives one level up in [`DocumentStore`](crate::store::DocumentStore).
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: Object-safe mirror of [`StoreBackend`] for dynamic dispatch
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances

use async_trait::async_trait;
use std::{any::Any, fmt::Debug};

use crate::{document::Document, error::DocumentStoreResult, query::Query, value::Fields};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single instance is shared by every
/// caller in the process.
///
/// # Error Handling
///
/// Implementations report failures precisely (not found, rejected, transport,
/// unauthenticated) and never swallow them.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates a document.
    ///
    /// With `id` the document at that path is created or fully replaced.
    /// Without it the backend assigns an identifier.
    ///
    /// # Returns
    ///
    /// The stored document as decoded from the backend, carrying its identifier.
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document>;

    /// Fetches one document by identifier, `Ok(None)` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>>;

    /// Fetches at most `limit` documents in backend order. This is a single
    /// page; callers must not assume it covers the whole collection.
    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>>;

    /// Merges `fields` into an existing document, leaving other fields untouched.
    ///
    /// Fails with [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// or a 404 rejection when the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()>;

    /// Deletes a document. Deleting a missing document follows the backend's
    /// own semantics.
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()>;

    /// Runs an equality query against a collection.
    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>>;

    /// Releases backend resources. The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        StoreBackend::create_document(*self, collection, fields, id).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        StoreBackend::get_document(*self, collection, id).await
    }

    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::list_documents(*self, collection, limit).await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        StoreBackend::update_document(*self, collection, id, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        StoreBackend::delete_document(*self, collection, id).await
    }

    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::query_documents(*self, collection, query).await
    }
}

/// Object-safe version of [`StoreBackend`], implemented for every backend.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document>;
    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>>;
    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>>;
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()>;
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()>;
    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        StoreBackend::create_document(self, collection, fields, id).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        StoreBackend::get_document(self, collection, id).await
    }

    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::list_documents(self, collection, limit).await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        StoreBackend::update_document(self, collection, id, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        StoreBackend::delete_document(self, collection, id).await
    }

    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::query_documents(self, collection, query).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A boxed backend chosen at runtime is itself a backend.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        DynStoreBackend::create_document(&**self, collection, fields, id).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        DynStoreBackend::get_document(&**self, collection, id).await
    }

    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        DynStoreBackend::list_documents(&**self, collection, limit).await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        DynStoreBackend::update_document(&**self, collection, id, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::delete_document(&**self, collection, id).await
    }

    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        DynStoreBackend::query_documents(&**self, collection, query).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}

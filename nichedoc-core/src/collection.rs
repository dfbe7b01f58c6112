//! Collection handles for document store operations.
//!
//! A handle binds a collection name to a borrowed backend so call sites do not
//! repeat the name on every operation.
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped collection working with [`Fields`] and [`Document`]s
//! - [`TypedCollection`] - Collection of a specific [`Record`] type
//!
//! # Example
//!
//! ```ignore
//! use nichedoc::prelude::*;
//!
//! # async fn example(store: &DocumentStore<impl StoreBackend>) -> DocumentStoreResult<()> {
//! let skills = store.collection("skills");
//! let created = skills.create(fields! { "name" => "Python" }, None).await?;
//! let found = skills.get(created.id()).await?;
//! # Ok(()) }
//! ```

use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    document::{Document, Record, RecordExt, validate_collection, validate_document_id},
    error::DocumentStoreResult,
    query::Query,
    value::Fields,
};

/// An untyped collection with a reference to a storage backend.
///
/// Collection names and document IDs are checked before anything reaches the
/// backend, so a bad segment never becomes a request path.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a document, under `id` when given (replacing any existing one),
    /// otherwise under an identifier chosen by the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the
    /// collection name or ID is malformed or the backend fails.
    pub async fn create(&self, fields: Fields, id: Option<&str>) -> DocumentStoreResult<Document> {
        validate_collection(&self.name)?;
        if let Some(id) = id {
            validate_document_id(id)?;
        }

        self.backend.create_document(&self.name, fields, id).await
    }

    /// Retrieves a document by ID, `None` when it does not exist.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Option<Document>> {
        validate_collection(&self.name)?;
        validate_document_id(id)?;

        self.backend.get_document(&self.name, id).await
    }

    /// Lists up to `limit` documents. This is one page, not the whole collection.
    pub async fn list(&self, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        validate_collection(&self.name)?;

        self.backend.list_documents(&self.name, limit).await
    }

    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Fails when the document does not exist; the update never creates it.
    pub async fn update(&self, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        validate_collection(&self.name)?;
        validate_document_id(id)?;

        self.backend.update_document(&self.name, id, fields).await
    }

    /// Deletes a document by ID.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        validate_collection(&self.name)?;
        validate_document_id(id)?;

        self.backend.delete_document(&self.name, id).await
    }

    /// Queries documents in the collection.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`Query`] holding the equality filter and the limit
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        validate_collection(&self.name)?;

        self.backend.query_documents(&self.name, query).await
    }
}

/// A collection of [`Record`]s of type `R`.
///
/// Records are converted to fields on the way in and rebuilt from documents on
/// the way out; the document identifier lands in the record's `_id` field.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, R: Record> {
    inner: Collection<'a, B>,
    _marker: PhantomData<R>,
}

impl<'a, B: StoreBackend, R: Record> TypedCollection<'a, B, R> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { inner: Collection::new(name, backend), _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the untyped view of this collection.
    pub fn untyped(&self) -> &Collection<'a, B> {
        &self.inner
    }

    /// Stores a record, returning it as read back from the backend.
    pub async fn insert(&self, record: &R, id: Option<&str>) -> DocumentStoreResult<R> {
        let document = self.inner.create(record.to_fields()?, id).await?;
        R::from_document(document)
    }

    /// Retrieves a record by ID.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Option<R>> {
        self.inner.get(id).await?.map(R::from_document).transpose()
    }

    /// Lists up to `limit` records.
    pub async fn list(&self, limit: usize) -> DocumentStoreResult<Vec<R>> {
        self.inner
            .list(limit)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }

    /// Overwrites the fields the record serializes, leaving any others intact.
    pub async fn update(&self, id: &str, record: &R) -> DocumentStoreResult<()> {
        self.inner.update(id, record.to_fields()?).await
    }

    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.inner.delete(id).await
    }

    /// Queries records matching the query.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<R>> {
        self.inner
            .query(query)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }
}

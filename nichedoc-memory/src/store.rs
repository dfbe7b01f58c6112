//! In-memory storage implementation for document stores.
//!
//! Documents live in ordered maps behind an async-aware read-write lock, so
//! listings come back in identifier order.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use uuid::Uuid;

use nichedoc_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
    value::Fields,
};

use crate::evaluator::DocumentEvaluator;

type CollectionMap = BTreeMap<String, Fields>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// It follows the remote store's observable semantics: creating under an
/// existing ID replaces the document, updates merge fields and fail on a
/// missing document, and deleting a missing document succeeds.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state.
/// Multiple clones of the same instance share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use nichedoc_memory::InMemoryStore;
/// use nichedoc::prelude::*;
///
/// let store = DocumentStore::new(InMemoryStore::new());
/// let created = store.create("skills", fields! { "name" => "Python" }, None).await;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> (document id -> fields)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of documents currently held in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id: Option<&str>,
    ) -> DocumentStoreResult<Document> {
        let id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        let mut store = self.store.write().await;
        store
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());

        tracing::debug!(collection, id = %id, "Stored document in memory");

        Ok(Document::new(id, fields))
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn list_documents(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(documents
            .iter()
            .take(limit)
            .map(|(id, fields)| Document::new(id.as_str(), fields.clone()))
            .collect())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let existing = store
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        existing.extend(fields);

        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if let Some(documents) = store.get_mut(collection) {
            documents.remove(id);
        }

        Ok(())
    }

    async fn query_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = Vec::new();
        for (id, fields) in documents {
            if matched.len() >= query.limit {
                break;
            }

            let keep = match &query.filter {
                Some(filter) => DocumentEvaluator::new(fields).evaluate(filter)?,
                None => true,
            };

            if keep {
                matched.push(Document::new(id.as_str(), fields.clone()));
            }
        }

        Ok(matched)
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use nichedoc_memory::InMemoryStore;
/// use nichedoc::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    seed: Vec<(String, String, Fields)>,
}

impl InMemoryStoreBuilder {
    /// Preloads a document, handy for fixtures.
    pub fn with_document(mut self, collection: &str, id: &str, fields: Fields) -> Self {
        self.seed.push((collection.to_string(), id.to_string(), fields));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut map = StoreMap::new();
        for (collection, id, fields) in self.seed {
            map.entry(collection).or_default().insert(id, fields);
        }

        Ok(InMemoryStore { store: Arc::new(RwLock::new(map)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nichedoc_core::{fields, query::Filter, value::Value};

    #[tokio::test]
    async fn create_without_id_generates_one() {
        let store = InMemoryStore::new();
        let created = store
            .create_document("skills", fields! { "name" => "Python" }, None)
            .await
            .unwrap();

        assert_eq!(created.id().len(), 32);
        let fetched = store.get_document("skills", created.id()).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_with_id_replaces() {
        let store = InMemoryStore::new();
        store
            .create_document("users", fields! { "name" => "Ada", "email" => "a@x" }, Some("1"))
            .await
            .unwrap();
        store
            .create_document("users", fields! { "name" => "Ada L." }, Some("1"))
            .await
            .unwrap();

        let fetched = store.get_document("users", "1").await.unwrap().unwrap();
        assert_eq!(fetched.fields(), &fields! { "name" => "Ada L." });
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing_document() {
        let store = InMemoryStore::builder()
            .with_document("skills", "s1", fields! { "name" => "Go", "category" => "Programming" })
            .build()
            .await
            .unwrap();

        store
            .update_document("skills", "s1", fields! { "description" => "new" })
            .await
            .unwrap();
        let fetched = store.get_document("skills", "s1").await.unwrap().unwrap();
        assert_eq!(fetched.get_str("name"), Some("Go"));
        assert_eq!(fetched.get_str("description"), Some("new"));

        let err = store
            .update_document("skills", "missing", fields! { "x" => 1 })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_document("skills", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.delete_document("skills", "nope").await.unwrap();
        assert_eq!(store.count("skills").await, 0);
    }

    #[tokio::test]
    async fn query_filters_then_limits() {
        let mut builder = InMemoryStore::builder();
        for (index, category) in ["Cloud", "Data", "Cloud", "Cloud"].iter().enumerate() {
            builder = builder.with_document("skills", &format!("s{index}"), fields! { "category" => *category });
        }
        let store = builder.build().await.unwrap();

        let query = Query::builder().filter(Filter::eq("category", "Cloud")).limit(2).build();
        let found = store.query_documents("skills", query).await.unwrap();

        assert_eq!(found.iter().map(Document::id).collect::<Vec<_>>(), vec!["s0", "s2"]);
        assert!(found.iter().all(|doc| doc.get("category") == Some(&Value::from("Cloud"))));
    }
}

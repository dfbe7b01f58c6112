//! Document store access layer for the findmyniche admin dashboard.
//!
//! This crate is the entry point of the nichedoc workspace. It re-exports the
//! core types, the storage backends, and the dashboard-level pieces built on
//! top of them: catalog records and seeding ([`catalog`]) and user mirroring
//! ([`users`]).
//!
//! # Features
//!
//! - **Two call styles** - `try_*` operations return `DocumentStoreResult`,
//!   the plain ones log failures and return `None`, `false` or an empty vec
//! - **Closed value model** - `Value` keeps integers, doubles, timestamps,
//!   arrays and maps distinct all the way to the wire
//! - **Backends** - Firestore over REST (`firestore` feature) and an in-memory
//!   store for tests and local runs
//!
//! # Quick Start
//!
//! ```ignore
//! use nichedoc::{prelude::*, memory::InMemoryStore, catalog::{self, Skill}};
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!
//!     let report = catalog::seed_skills(&store, false).await;
//!     println!("seeded {} skills", report.created);
//!
//!     let python = store
//!         .query("skills", [("name", Value::from("Python"))], 1)
//!         .await;
//!     assert_eq!(python[0].get_str("category"), Some("Programming & Development"));
//!
//!     let cloud = catalog::skills_by_category(&store, "Cloud & DevOps").await?;
//!     println!("{} cloud skills", cloud.len());
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is picked at runtime (Firestore in production, memory in
//! tests), erase its type with `into_dyn`:
//!
//! ```ignore
//! use nichedoc::{prelude::*, memory::InMemoryStore};
//!
//! let store: DynDocumentStore = DocumentStore::new(InMemoryStore::new()).into_dyn();
//! let skills = store.read_all("skills", 10).await;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `firestore` - Firestore REST backend (requires the `firestore` feature)

pub mod catalog;
pub mod prelude;
pub mod users;

pub use nichedoc_core::{backend, collection, document, error, fields, page, query, store, value};

/// In-memory storage backend implementations.
pub mod memory {
    pub use nichedoc_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// Firestore storage backend implementations.
///
/// This module is only available when the `firestore` feature is enabled.
#[cfg(feature = "firestore")]
pub mod firestore {
    pub use nichedoc_firestore::{
        AccessToken, CredentialsSource, FirestoreConfig, FirestoreStore, FirestoreStoreBuilder,
        ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
    };
}

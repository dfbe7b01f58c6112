//! In-memory document storage backend for nichedoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It mirrors the remote store's observable behaviour
//! closely enough to run store-level scenarios in tests and local development.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Equality queries** - Evaluates query filters through the `QueryVisitor` trait
//! - **Fixtures** - Preload documents through the builder
//!
//! # Quick Start
//!
//! ```ignore
//! use nichedoc::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!
//!     let skill = store.create("skills", fields! { "name" => "Python" }, None).await;
//!     assert!(skill.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as nichedoc_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};

//! Firestore backend for nichedoc.
//!
//! Talks to the Firestore REST API with `reqwest`, authenticating with a
//! service-account key (or a static token for the emulator). The store
//! implements `StoreBackend`, so it plugs into `DocumentStore` like any other
//! backend.
//!
//! # Quick Start
//!
//! ```ignore
//! use nichedoc::{prelude::*, firestore::{FirestoreConfig, FirestoreStore}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FirestoreConfig::new("my-project")
//!         .credentials_file("storage/firebase/service-account.json");
//!     let store = DocumentStore::new(FirestoreStore::builder(config).build().await?);
//!
//!     let skills = store.query("skills", [("category", Value::from("Cloud & DevOps"))], 50).await;
//!     println!("{} skills", skills.len());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as nichedoc_firestore;

pub mod auth;
pub mod codec;
pub mod config;
pub mod query;
pub mod store;

pub use auth::{AccessToken, ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use config::{CredentialsSource, FirestoreConfig};
pub use store::{FirestoreStore, FirestoreStoreBuilder};

//! A small document store access layer with a unified interface over
//! document backends.
//!
//! This crate is the core of the nichedoc project and provides:
//!
//! - **Values** ([`value`]) - The closed value model stored in documents
//! - **Documents and records** ([`document`]) - Stored documents and typed records
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query API** ([`query`]) - Equality queries and the visitor backends consume
//! - **Collections interface** ([`collection`]) - Handles bound to one collection
//! - **Document store** ([`store`]) - Result and fail-soft document operations
//! - **Error handling** ([`error`]) - Error and result types
//! - **Pagination** ([`page`]) - In-memory pagination and filtering helpers
//!
//! # Example
//!
//! ```ignore
//! use nichedoc_core::{document::Record, fields};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Skill {
//!     #[serde(rename = "_id", default, skip_serializing)]
//!     pub id: Option<String>,
//!     pub name: String,
//! }
//!
//! impl Record for Skill {
//!     fn collection_name() -> &'static str {
//!         "skills"
//!     }
//! }
//!
//! let raw = fields! { "name" => "Python", "category" => "Programming" };
//! ```

#[allow(unused_extern_crates)]
extern crate self as nichedoc_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod store;
pub mod value;

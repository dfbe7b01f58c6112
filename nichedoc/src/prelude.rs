//! Convenient re-exports of commonly used types from nichedoc.
//!
//! ```ignore
//! use nichedoc::prelude::*;
//! ```

pub use nichedoc_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    document::{Document, Record, RecordExt},
    error::{DocumentStoreError, DocumentStoreResult},
    fields,
    page::{Page, PaginationParams},
    query::{Expr, Filter, Query, QueryBuilder, QueryVisitor},
    store::{DocumentStore, DynDocumentStore},
    value::{Fields, Value},
};

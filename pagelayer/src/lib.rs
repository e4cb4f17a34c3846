//! Main pagelayer crate providing paged queries over document stores.
//!
//! This crate is the primary entry point for users of the pagelayer framework.
//! It re-exports the core types and functionality from the sub-crates and provides
//! access to the available storage backends.
//!
//! # Features
//!
//! - **Fluent page requests** - Filter, project, sort, page and limit in one chain
//! - **Two execution modes** - Flat filtered reads, or aggregation pipelines with a facet stage
//! - **Pagination metadata** - Total count, total pages and navigation flags with every page
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use pagelayer::{prelude::*, memory::InMemoryBackend};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = InMemoryBackend::builder()
//!         .with_documents("users", vec![
//!             doc! { "name": "Alice", "active": true },
//!             doc! { "name": "Bob", "active": false },
//!         ])
//!         .build()
//!         .await
//!         .unwrap();
//!     let store = PagingStore::new(backend);
//!
//!     // Find mode: a filter is mandatory, pass `doc! {}` to match everything
//!     let page = store
//!         .collection("users")
//!         .paging()
//!         .filter(doc! { "active": true })
//!         .sort("name", SortDirection::Asc)
//!         .limit(10)
//!         .page(1)
//!         .find()
//!         .await
//!         .unwrap();
//!
//!     println!("{}", page.into_json().unwrap());
//! }
//! ```
//!
//! # Aggregate Mode
//!
//! Aggregate mode takes pipeline stages instead of a filter. A facet stage is
//! appended that sorts by `createdAt` descending, slices the requested page and
//! counts the total, all in one request.
//!
//! ```ignore
//! let page = store
//!     .collection("orders")
//!     .paging()
//!     .limit(20)
//!     .page(3)
//!     .aggregate(vec![
//!         doc! { "$match": { "status": "open" } },
//!         doc! { "$project": { "status": 1, "createdAt": 1 } },
//!     ])
//!     .await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use pagelayer_core::{backend, collection, error, page, paginate, query, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use pagelayer_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use pagelayer_mongodb::{MongoPagingBackend, MongoPagingBackendBuilder};
}

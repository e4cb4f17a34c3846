//! In-memory paging backend for pagelayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `PagingBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is intended for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Query evaluation** - Filters, projections, sorting, skip and limit
//! - **Pipelines** - `$match`, `$sort`, `$skip`, `$limit`, `$count`, `$project` and `$facet`
//!
//! # Quick Start
//!
//! ```ignore
//! use pagelayer::{prelude::*, memory::InMemoryBackend};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryBackend::builder()
//!         .with_documents("users", vec![doc! { "name": "Alice" }])
//!         .build()
//!         .await?;
//!     let store = PagingStore::new(backend);
//!
//!     let page = store
//!         .collection("users")
//!         .paging()
//!         .filter(doc! {})
//!         .limit(10)
//!         .page(1)
//!         .find()
//!         .await?;
//!
//!     assert_eq!(page.pagination.total, 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pagelayer_memory;

pub mod store;
mod evaluator;
mod pipeline;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};

//! Page-at-a-time queries over BSON document stores.
//!
//! This crate is the core of the pagelayer project and provides:
//!
//! - **Paged query builder** ([`query`]) - Fluent construction of a page request
//! - **Query execution** ([`paginate`]) - Find and aggregate execution modes
//! - **Pagination types** ([`page`]) - Result pages, metadata and offset arithmetic
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Collections and stores** ([`collection`], [`store`]) - Handles a query is started from
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use pagelayer::{prelude::*, memory::InMemoryBackend};
//! use bson::doc;
//!
//! let store = PagingStore::new(InMemoryBackend::new());
//!
//! let page = store
//!     .collection("orders")
//!     .paging()
//!     .limit(10)
//!     .page(2)
//!     .aggregate(vec![doc! { "$match": { "status": "open" } }])
//!     .await?;
//!
//! println!("{} of {} orders", page.data.len(), page.pagination.total);
//! ```

#[allow(unused_extern_crates)]
extern crate self as pagelayer_core;

pub mod backend;
pub mod collection;
pub mod error;
pub mod page;
pub mod paginate;
pub mod query;
pub mod store;

#[cfg(test)]
mod testing;

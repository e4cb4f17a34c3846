//! MongoDB backend implementation for pagelayer.
//!
//! This crate provides a MongoDB-based implementation of the `PagingBackend` trait.
//! Find-mode queries map onto the driver's `find` and `count_documents`; aggregate-mode
//! queries run as a single `aggregate` call with disk use allowed.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! pagelayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pagelayer::{prelude::*, mongodb::MongoPagingBackend};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoPagingBackend::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!     let store = PagingStore::new(backend);
//!
//!     let page = store
//!         .collection("users")
//!         .paging()
//!         .filter(doc! { "active": true })
//!         .sort("name", SortDirection::Asc)
//!         .limit(20)
//!         .page(1)
//!         .find()
//!         .await?;
//!
//!     store.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pagelayer_mongodb;

pub mod store;

pub use store::{MongoPagingBackend, MongoPagingBackendBuilder};

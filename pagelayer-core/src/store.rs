//! Main entry point for paging through a document backend.
//!
//! ```ignore
//! use pagelayer::{prelude::*, memory::InMemoryBackend};
//!
//! let store = PagingStore::new(InMemoryBackend::builder().build().await?);
//! let page = store
//!     .collection("users")
//!     .paging()
//!     .filter(doc! {})
//!     .limit(20)
//!     .page(1)
//!     .find()
//!     .await?;
//! ```

use crate::{backend::PagingBackend, collection::Collection, error::PagingResult};

/// A paging store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct PagingStore<B: PagingBackend> {
    backend: B,
}

impl<B: PagingBackend> PagingStore<B> {
    /// Creates a new paging store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a handle on the collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shuts down the store, releasing the backend.
    pub async fn shutdown(self) -> PagingResult<()> {
        self.backend.shutdown().await
    }
}

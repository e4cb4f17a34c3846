//! Collection handles for paged queries.
//!
//! A [`Collection`] binds a collection name to a borrowed backend. It is the
//! handle a [`PagingQuery`] is constructed from.

use crate::{backend::PagingBackend, query::PagingQuery};

/// A named collection with a reference to a storage backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: PagingBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: PagingBackend> Collection<'a, B> {
    /// Creates a new collection handle.
    pub fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backend this collection is read from.
    pub fn backend(&self) -> &'a B {
        self.backend
    }

    /// Starts a paged query against this collection.
    pub fn paging(self) -> PagingQuery<'a, B> {
        PagingQuery::new(self)
    }
}

impl<B: PagingBackend> Clone for Collection<'_, B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: self.backend,
        }
    }
}

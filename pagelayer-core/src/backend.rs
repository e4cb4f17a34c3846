//! Storage backend abstraction for paged queries.
//!
//! This module defines the traits that abstract over the document store a
//! [`PagingQuery`](crate::query::PagingQuery) runs against. A backend knows how to
//! run a filtered read, count the documents matching a filter, and run an
//! aggregation pipeline. Reads hand back a [`DocumentCursor`] that is iterated
//! and explicitly closed by the caller.
//!
//! # Traits
//!
//! - [`PagingBackend`]: The core trait for storage backends
//! - [`DocumentCursor`]: Forward-only iteration handle over query results
//! - [`PagingBackendBuilder`]: Factory trait for creating backend instances

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::error::PagingResult;

/// A filtered read issued by the find execution mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    /// The query predicate. An empty document matches everything.
    pub filter: Document,
    /// Number of matching documents to discard before the first returned one.
    pub skip: i64,
    /// Maximum number of documents to return.
    pub limit: i64,
    /// Optional field selection.
    pub projection: Option<Document>,
    /// Optional sort specification, e.g. `{ "name": 1 }`.
    pub sort: Option<Document>,
}

/// Forward-only iteration handle over the documents produced by a query.
///
/// Mirrors the driver cursor protocol: [`advance`](DocumentCursor::advance) moves to the
/// next document and [`deserialize_current`](DocumentCursor::deserialize_current) decodes
/// it. A failed `advance` is an execution error; a failed `deserialize_current` concerns a
/// single document only. The cursor must be [`close`](DocumentCursor::close)d once the
/// caller is done with it, whatever the outcome.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Moves to the next document. Returns `Ok(false)` once the results are exhausted.
    async fn advance(&mut self) -> PagingResult<bool>;

    /// Decodes the document the cursor currently points at.
    fn deserialize_current(&self) -> PagingResult<Document>;

    /// Releases the cursor and any server-side resources attached to it.
    async fn close(self: Box<Self>) -> PagingResult<()>;
}

/// Abstract interface for the document store a paged query runs against.
///
/// Implementations must be thread-safe. Every method issues exactly one request to
/// the underlying store and reports failures as
/// [`PagingError::Backend`](crate::error::PagingError::Backend) without retrying.
#[async_trait]
pub trait PagingBackend: Send + Sync + Debug {
    /// Runs a filtered read against `collection`.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection to read from
    /// * `request` - Filter, skip, limit, projection and sort to apply
    async fn find(
        &self,
        collection: &str,
        request: FindRequest,
    ) -> PagingResult<Box<dyn DocumentCursor>>;

    /// Counts the documents of `collection` matching `filter`.
    async fn count_documents(&self, collection: &str, filter: Document) -> PagingResult<i64>;

    /// Runs an aggregation pipeline against `collection`.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection to aggregate
    /// * `stages` - The pipeline stages, in execution order
    /// * `allow_disk_use` - Whether stages may spill large working sets to disk
    async fn aggregate(
        &self,
        collection: &str,
        stages: Vec<Document>,
        allow_disk_use: bool,
    ) -> PagingResult<Box<dyn DocumentCursor>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> PagingResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> PagingBackend for &B
where
    B: PagingBackend,
{
    async fn find(
        &self,
        collection: &str,
        request: FindRequest,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        (*self).find(collection, request).await
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> PagingResult<i64> {
        (*self).count_documents(collection, filter).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        stages: Vec<Document>,
        allow_disk_use: bool,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        (*self)
            .aggregate(collection, stages, allow_disk_use)
            .await
    }
}

#[async_trait]
pub trait PagingBackendBuilder {
    type Backend: PagingBackend;

    async fn build(self) -> PagingResult<Self::Backend>;
}

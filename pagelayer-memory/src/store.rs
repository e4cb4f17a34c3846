//! In-memory storage implementation for paged queries.
//!
//! Collections are kept as insertion-ordered vectors of BSON documents behind an
//! async-aware read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Document;

use pagelayer_core::{
    backend::{DocumentCursor, FindRequest, PagingBackend, PagingBackendBuilder},
    error::{PagingError, PagingResult},
};

use crate::{
    evaluator::{DocumentEvaluator, project, sort_documents},
    pipeline,
};

pub const TRACING_TARGET: &str = "pagelayer_memory::store";

type StoreMap = HashMap<String, Vec<Document>>;


/// Thread-safe in-memory paging backend.
///
/// `InMemoryBackend` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be shared across async tasks. Clones share the same underlying data.
///
/// Queries scan every document of a collection; there is no indexing. A collection
/// that was never written to behaves as an empty one.
///
/// # Example
///
/// ```ignore
/// use pagelayer_memory::InMemoryBackend;
/// use bson::doc;
///
/// let backend = InMemoryBackend::new();
/// backend
///     .insert_documents("users", vec![doc! { "name": "Alice" }, doc! { "name": "Bob" }])
///     .await;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBackend {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryBackend`.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::default()
    }

    /// Appends documents to a collection, creating it if needed.
    pub async fn insert_documents(&self, collection: &str, documents: Vec<Document>) {
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    async fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PagingBackend for InMemoryBackend {
    async fn find(&self, collection: &str, request: FindRequest) -> PagingResult<Box<dyn DocumentCursor>> {
        tracing::trace!(
            target: TRACING_TARGET,
            collection,
            skip = request.skip,
            limit = request.limit,
            "Finding documents"
        );

        let mut documents = {
            let store = self.store.read().await;
            match store.get(collection) {
                Some(documents) => DocumentEvaluator::filter_documents(documents, &request.filter)?,
                None => Vec::new(),
            }
        };

        if let Some(sort) = &request.sort {
            sort_documents(&mut documents, sort)?;
        }

        // A limit of zero means no limit.
        let skip = usize::try_from(request.skip).unwrap_or(0);
        let limit = usize::try_from(request.limit)
            .ok()
            .filter(|limit| *limit > 0)
            .unwrap_or(usize::MAX);

        let documents = documents
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| match &request.projection {
                Some(projection) => project(&document, projection),
                None => Ok(document),
            })
            .collect::<PagingResult<Vec<_>>>()?;

        Ok(Box::new(MemoryCursor::new(documents)))
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> PagingResult<i64> {
        let store = self.store.read().await;
        let count = match store.get(collection) {
            Some(documents) => DocumentEvaluator::filter_documents(documents, &filter)?.len(),
            None => 0,
        };

        Ok(count as i64)
    }

    async fn aggregate(
        &self,
        collection: &str,
        stages: Vec<Document>,
        _allow_disk_use: bool,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        tracing::trace!(
            target: TRACING_TARGET,
            collection,
            stages = stages.len(),
            "Aggregating documents"
        );

        let documents = pipeline::run(self.snapshot(collection).await, &stages)?;

        Ok(Box::new(MemoryCursor::new(documents)))
    }
}

/// Cursor over documents already materialized by the in-memory backend.
struct MemoryCursor {
    documents: std::vec::IntoIter<Document>,
    current: Option<Document>,
}

impl MemoryCursor {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
            current: None,
        }
    }
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn advance(&mut self) -> PagingResult<bool> {
        self.current = self.documents.next();

        Ok(self.current.is_some())
    }

    fn deserialize_current(&self) -> PagingResult<Document> {
        self.current
            .clone()
            .ok_or_else(|| PagingError::Serialization("cursor is not positioned on a document".to_string()))
    }

    async fn close(self: Box<Self>) -> PagingResult<()> {
        Ok(())
    }
}


/// Builder for constructing [`InMemoryBackend`] instances.
///
/// # Example
///
/// ```ignore
/// use pagelayer_memory::InMemoryBackend;
/// use pagelayer::backend::PagingBackendBuilder;
///
/// let backend = InMemoryBackend::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryBackendBuilder {
    seed: HashMap<String, Vec<Document>>,
}

impl InMemoryBackendBuilder {
    /// Seeds a collection with documents when the backend is built.
    pub fn with_documents(mut self, collection: &str, documents: Vec<Document>) -> Self {
        self.seed
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        self
    }
}

#[async_trait]
impl PagingBackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    /// Builds and returns a new [`InMemoryBackend`] holding the seeded collections.
    async fn build(self) -> PagingResult<Self::Backend> {
        Ok(InMemoryBackend {
            store: Arc::new(RwLock::new(self.seed)),
        })
    }
}

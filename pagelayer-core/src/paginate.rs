//! Execution of paged queries.
//!
//! Both execution modes validate the [`PageSpec`], derive the skip offset, issue
//! their request to the backend, drain the returned cursor and assemble a [`Page`].
//!
//! - Find mode runs the filtered read and the matching count concurrently.
//! - Aggregate mode appends a facet stage to the caller's pipeline. The facet's
//!   `data` arm sorts by [`FACET_SORT_FIELD`] descending, skips and limits; its
//!   `total` arm counts. Both arms come back in a single result document.
//!
//! Documents that fail to decode while draining a cursor are dropped from the page
//! and logged. They still count towards the reported total.

use bson::{Document, doc};
use futures::join;
use serde::Deserialize;

use crate::{
    backend::{DocumentCursor, FindRequest, PagingBackend},
    collection::Collection,
    error::{PagingError, PagingResult},
    page::{self, Page},
    query::PageSpec,
};

pub const TRACING_TARGET: &str = "pagelayer_core::paginate";

/// Field the facet `data` arm sorts on, newest first.
pub const FACET_SORT_FIELD: &str = "createdAt";

/// Field the facet `total` arm writes its count to.
pub const FACET_COUNT_FIELD: &str = "count";

/// Aggregations are allowed to spill to disk.
pub const ALLOW_DISK_USE: bool = true;

/// Builds the facet stage appended to every aggregate-mode pipeline.
///
/// ```ignore
/// assert_eq!(
///     facet_stage(20, 10),
///     doc! {
///         "$facet": {
///             "data": [{ "$sort": { "createdAt": -1 } }, { "$skip": 20_i64 }, { "$limit": 10_i64 }],
///             "total": [{ "$count": "count" }],
///         }
///     }
/// );
/// ```
pub fn facet_stage(skip: i64, limit: i64) -> Document {
    doc! {
        "$facet": {
            "data": [
                { "$sort": { FACET_SORT_FIELD: -1 } },
                { "$skip": skip },
                { "$limit": limit },
            ],
            "total": [
                { "$count": FACET_COUNT_FIELD },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct FacetCount {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct FacetResult {
    #[serde(default)]
    total: Vec<FacetCount>,
    #[serde(default)]
    data: Vec<Document>,
}

pub(crate) async fn find_page<B: PagingBackend>(
    collection: &Collection<'_, B>,
    spec: PageSpec,
) -> PagingResult<Page> {
    spec.validate()?;

    let sort = spec.sort_document();
    let PageSpec {
        filter,
        projection,
        limit,
        page,
        ..
    } = spec;
    let filter = filter.ok_or(PagingError::NilFilter)?;
    let skip = page::skip(page, limit);

    tracing::debug!(
        target: TRACING_TARGET,
        collection = collection.name(),
        page,
        limit,
        skip,
        has_projection = projection.is_some(),
        has_sort = sort.is_some(),
        "Running paged find"
    );

    let request = FindRequest {
        filter: filter.clone(),
        skip,
        limit,
        projection,
        sort,
    };
    let backend = collection.backend();

    // Both arms run to completion so the cursor is closed even if the count fails.
    let (data, total) = join!(
        async {
            let cursor = backend.find(collection.name(), request).await?;
            drain(cursor, collection.name()).await
        },
        backend.count_documents(collection.name(), filter),
    );
    let (data, total) = (data?, total?);

    Ok(assemble(collection.name(), data, total, page, limit))
}

pub(crate) async fn aggregate_page<B: PagingBackend>(
    collection: &Collection<'_, B>,
    spec: PageSpec,
    mut stages: Vec<Document>,
) -> PagingResult<Page> {
    spec.validate()?;

    if spec.filter.is_some() {
        return Err(PagingError::FilterInAggregate);
    }

    let skip = page::skip(spec.page, spec.limit);
    stages.push(facet_stage(skip, spec.limit));

    tracing::debug!(
        target: TRACING_TARGET,
        collection = collection.name(),
        page = spec.page,
        limit = spec.limit,
        skip,
        stages = stages.len(),
        "Running paged aggregate"
    );

    let cursor = collection
        .backend()
        .aggregate(collection.name(), stages, ALLOW_DISK_USE)
        .await?;
    let facets = drain(cursor, collection.name())
        .await?
        .into_iter()
        .filter_map(|document| match bson::deserialize_from_document::<FacetResult>(document) {
            Ok(facet) => Some(facet),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    collection = collection.name(),
                    error = %err,
                    "Dropping malformed facet result"
                );
                None
            }
        })
        .collect::<Vec<_>>();

    // An empty data arm reports a total of 0 even when the count arm has rows.
    let (data, total) = match facets.into_iter().next() {
        Some(facet) if !facet.data.is_empty() => (
            facet.data,
            facet.total.first().map(|total| total.count).unwrap_or(0),
        ),
        _ => (Vec::new(), 0),
    };

    Ok(assemble(collection.name(), data, total, spec.page, spec.limit))
}

/// Reads every document from `cursor`, then closes it.
///
/// Documents that fail to decode are skipped. A failure to advance the cursor aborts
/// the read; the cursor is closed before the error is returned.
async fn drain(
    mut cursor: Box<dyn DocumentCursor>,
    collection: &str,
) -> PagingResult<Vec<Document>> {
    let mut documents = Vec::new();
    let mut skipped = 0_usize;

    let outcome = loop {
        match cursor.advance().await {
            Ok(true) => match cursor.deserialize_current() {
                Ok(document) => documents.push(document),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        target: TRACING_TARGET,
                        collection,
                        error = %err,
                        "Skipping document that failed to decode"
                    );
                }
            },
            Ok(false) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    if let Err(err) = cursor.close().await {
        tracing::warn!(
            target: TRACING_TARGET,
            collection,
            error = %err,
            "Failed to close cursor"
        );
    }

    outcome?;

    if skipped > 0 {
        tracing::debug!(
            target: TRACING_TARGET,
            collection,
            returned = documents.len(),
            skipped,
            "Cursor drained with undecodable documents"
        );
    }

    Ok(documents)
}

fn assemble(collection: &str, data: Vec<Document>, total: i64, page: i64, limit: i64) -> Page {
    let page = Page::builder(data)
        .with_total(total)
        .with_page(page)
        .with_limit(limit)
        .build();

    tracing::debug!(
        target: TRACING_TARGET,
        collection,
        returned = page.len(),
        total = page.pagination.total,
        total_pages = page.pagination.total_pages,
        "Assembled page"
    );

    page
}

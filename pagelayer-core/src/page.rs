//! Pagination and result types for paged queries.
//!
//! This module provides the [`Page`] returned by every paged query, the
//! [`PaginationMetadata`] that travels with it, and the pure arithmetic shared by
//! both execution modes: [`skip`] and [`PaginationMetadata::new`].

use bson::Document;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::error::{PagingError, PagingResult};

/// Page size used when the caller asks for fewer than one document per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Page served when the caller asks for a page below the first one.
pub const DEFAULT_PAGE: i64 = 1;

/// Calculates the number of documents to skip before the requested page begins.
///
/// Pages are 1-indexed. A non-positive page never reaches this function through
/// [`PagingQuery`](crate::query::PagingQuery); if it does, the raw page value is
/// used as the offset.
///
/// # Example
///
/// ```ignore
/// use pagelayer::page::skip;
///
/// assert_eq!(skip(1, 10), 0);
/// assert_eq!(skip(3, 10), 20);
/// ```
pub fn skip(page: i64, limit: i64) -> i64 {
    if page > 0 {
        (page - 1).saturating_mul(limit)
    } else {
        page
    }
}

/// Navigation metadata for a single page of results.
///
/// Derived purely from `(total, page, limit)`; computing it twice for the same
/// triple yields the same value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    /// Total count of documents matching the query across all pages.
    pub total: i64,
    /// The current page number (1-indexed).
    pub page: i64,
    /// Maximum number of documents per page.
    pub limit: i64,
    /// Number of pages needed to hold `total` documents.
    pub total_pages: i64,
    /// Whether a page exists before this one.
    pub has_previous: bool,
    /// Whether a page exists after this one.
    pub has_next: bool,
    /// The previous page number, if any.
    #[serde(rename = "prev", default, skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<i64>,
    /// The next page number, if any.
    #[serde(rename = "next", default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
}

impl PaginationMetadata {
    /// Computes the metadata for `page` of a result set of `total` documents split
    /// into pages of `limit` documents.
    ///
    /// A non-positive `limit` yields zero pages instead of dividing by zero.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let meta = PaginationMetadata::new(25, 3, 10);
    ///
    /// assert_eq!(meta.total_pages, 3);
    /// assert!(meta.has_previous);
    /// assert!(!meta.has_next);
    /// ```
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 && total > 0 {
            total / limit + i64::from(total % limit != 0)
        } else {
            0
        };
        let has_previous = page > 1;
        let has_next = page < total_pages;

        Self {
            total,
            page,
            limit,
            total_pages,
            has_previous,
            has_next,
            previous_page: has_previous.then(|| page - 1),
            next_page: has_next.then(|| page + 1),
        }
    }
}

/// A single page of query results together with its pagination metadata.
///
/// The documents are opaque BSON documents by default; use [`Page::decode`] to
/// obtain a typed page.
///
/// # Type Parameters
///
/// * `T` - The type of items contained in this page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T = Document> {
    /// The documents of this page, in query order. Never longer than the page limit.
    pub data: Vec<T>,
    /// Navigation metadata for this page.
    pub pagination: PaginationMetadata,
}

impl<T> Page<T> {
    /// Creates a new builder for assembling a page from retrieved documents.
    pub fn builder(data: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(data)
    }

    /// Number of documents on this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if this page holds no documents.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Page<Document> {
    /// Deserializes every document of this page into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`PagingError::Serialization`](crate::error::PagingError::Serialization)
    /// if any document does not match `T`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct User { name: String }
    ///
    /// let users: Page<User> = page.decode()?;
    /// ```
    pub fn decode<T>(self) -> PagingResult<Page<T>>
    where
        T: DeserializeOwned,
    {
        Ok(Page {
            data: self
                .data
                .into_iter()
                .map(|document| bson::deserialize_from_document::<T>(document).map_err(PagingError::from))
                .collect::<PagingResult<Vec<T>>>()?,
            pagination: self.pagination,
        })
    }

    /// Renders the page in its JSON output shape: `{ "data": [...], "pagination": {...} }`.
    pub fn into_json(self) -> PagingResult<Value> {
        Ok(json!({
            "data": self
                .data
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?,
            "pagination": serde_json::to_value(self.pagination)?,
        }))
    }
}

/// Builder for assembling a [`Page`] from retrieved documents and a total count.
pub struct PageBuilder<T> {
    data: Vec<T>,
    total: i64,
    page: i64,
    limit: i64,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given documents.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            total: 0,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Sets the total count of matching documents across all pages.
    pub fn with_total(mut self, total: i64) -> Self {
        self.total = total;
        self
    }

    /// Sets the current page number.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Computes the metadata and returns the final [`Page`].
    pub fn build(self) -> Page<T> {
        Page {
            data: self.data,
            pagination: PaginationMetadata::new(self.total, self.page, self.limit),
        }
    }
}

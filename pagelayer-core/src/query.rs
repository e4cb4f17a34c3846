//! Paged query construction.
//!
//! A [`PagingQuery`] accumulates a [`PageSpec`] through chained setter calls and is
//! consumed by one of its two terminal operations:
//!
//! - [`PagingQuery::find`] runs a flat filtered read
//! - [`PagingQuery::aggregate`] runs caller-supplied pipeline stages followed by a facet
//!   stage that slices the page and counts the total in the same request
//!
//! ```ignore
//! use pagelayer::prelude::*;
//! use bson::doc;
//!
//! let page = store
//!     .collection("users")
//!     .paging()
//!     .filter(doc! { "active": true })
//!     .sort("name", SortDirection::Asc)
//!     .limit(10)
//!     .page(2)
//!     .find()
//!     .await?;
//! ```
//!
//! Setters take the builder by value and the terminal operations consume it, so a
//! builder can never be mutated by two callers at once.

use bson::{Document, doc};

use crate::{
    backend::PagingBackend,
    collection::Collection,
    error::{PagingError, PagingResult},
    page::{DEFAULT_LIMIT, DEFAULT_PAGE, Page},
    paginate,
};

/// Sort direction for find-mode results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// The wire value of this direction in a sort document.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

impl TryFrom<i32> for SortDirection {
    type Error = i32;

    /// Accepts the integer form used by sort documents: positive for ascending,
    /// negative for descending. Zero carries no direction and is rejected.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            v if v > 0 => Ok(SortDirection::Asc),
            v if v < 0 => Ok(SortDirection::Desc),
            v => Err(v),
        }
    }
}

/// Configuration of one paged query.
///
/// A default `PageSpec` has `limit` and `page` set to `0`, meaning "unset". Going
/// through [`PagingQuery::limit`] and [`PagingQuery::page`] coerces out-of-range values
/// to [`DEFAULT_LIMIT`] and [`DEFAULT_PAGE`]; building a `PageSpec` directly does not, and
/// [`PageSpec::validate`] rejects what slips through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSpec {
    /// Query predicate. Required in find mode, forbidden in aggregate mode.
    pub filter: Option<Document>,
    /// Field selection, find mode only.
    pub projection: Option<Document>,
    /// Field to sort by, find mode only. Empty means unsorted.
    pub sort_field: Option<String>,
    /// Direction to sort `sort_field` in.
    pub sort_direction: Option<SortDirection>,
    /// Page size.
    pub limit: i64,
    /// 1-indexed page number.
    pub page: i64,
}

impl PageSpec {
    /// Checks that both the page and the limit are positive.
    ///
    /// # Errors
    ///
    /// Returns [`PagingError::PageLimit`] otherwise.
    pub fn validate(&self) -> PagingResult<()> {
        if self.limit <= 0 || self.page <= 0 {
            return Err(PagingError::PageLimit);
        }

        Ok(())
    }

    /// The sort document for find mode, present only when a non-empty field and a
    /// direction were both set.
    pub fn sort_document(&self) -> Option<Document> {
        match (&self.sort_field, self.sort_direction) {
            (Some(field), Some(direction)) if !field.is_empty() => {
                Some(doc! { field.as_str(): direction.as_i32() })
            }
            _ => None,
        }
    }
}

/// Fluent builder for a single paged query against one collection.
#[derive(Debug)]
pub struct PagingQuery<'a, B: PagingBackend> {
    collection: Collection<'a, B>,
    spec: PageSpec,
}

impl<'a, B: PagingBackend> PagingQuery<'a, B> {
    /// Creates an empty query bound to `collection`.
    pub fn new(collection: Collection<'a, B>) -> Self {
        Self::with_spec(collection, PageSpec::default())
    }

    /// Creates a query from a ready-made [`PageSpec`], bypassing setter coercion.
    pub fn with_spec(collection: Collection<'a, B>, spec: PageSpec) -> Self {
        Self { collection, spec }
    }

    /// Returns the configuration accumulated so far.
    pub fn spec(&self) -> &PageSpec {
        &self.spec
    }

    /// Restricts the fields returned for each document.
    pub fn select(mut self, projection: Document) -> Self {
        self.spec.projection = Some(projection);
        self
    }

    /// Sets the query predicate. Pass an empty document to match everything.
    pub fn filter(mut self, filter: Document) -> Self {
        self.spec.filter = Some(filter);
        self
    }

    /// Sets the page size. Values below 1 fall back to [`DEFAULT_LIMIT`].
    pub fn limit(mut self, limit: i64) -> Self {
        self.spec.limit = if limit < 1 { DEFAULT_LIMIT } else { limit };
        self
    }

    /// Sets the page to serve. Values below 1 fall back to [`DEFAULT_PAGE`].
    pub fn page(mut self, page: i64) -> Self {
        self.spec.page = if page < 1 { DEFAULT_PAGE } else { page };
        self
    }

    /// Sorts find-mode results by `field`.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.spec.sort_field = Some(field.into());
        self.spec.sort_direction = Some(direction);
        self
    }

    /// Runs the query as a filtered read and returns the requested page.
    ///
    /// # Errors
    ///
    /// - [`PagingError::PageLimit`] if the page or the limit is not positive
    /// - [`PagingError::NilFilter`] if no filter was set
    /// - [`PagingError::Backend`] if the store fails to run the query
    pub async fn find(self) -> PagingResult<Page> {
        paginate::find_page(&self.collection, self.spec).await
    }

    /// Runs `stages` followed by a facet stage and returns the requested page.
    ///
    /// Filtering in aggregate mode is expressed as `$match` stages in `stages`.
    ///
    /// # Errors
    ///
    /// - [`PagingError::PageLimit`] if the page or the limit is not positive
    /// - [`PagingError::FilterInAggregate`] if a filter was set on the builder
    /// - [`PagingError::Backend`] if the store fails to run the pipeline
    pub async fn aggregate(
        self,
        stages: impl IntoIterator<Item = Document>,
    ) -> PagingResult<Page> {
        paginate::aggregate_page(
            &self.collection,
            self.spec,
            stages.into_iter().collect(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    fn query(backend: &ScriptedBackend) -> PagingQuery<'_, ScriptedBackend> {
        Collection::new("items".to_string(), backend).paging()
    }

    #[test]
    fn limit_is_coerced_below_one() {
        let backend = ScriptedBackend::default();

        assert_eq!(query(&backend).limit(0).spec().limit, 10);
        assert_eq!(query(&backend).limit(-3).spec().limit, 10);
        assert_eq!(query(&backend).limit(1).spec().limit, 1);
        assert_eq!(query(&backend).limit(250).spec().limit, 250);
    }

    #[test]
    fn page_is_coerced_below_one() {
        let backend = ScriptedBackend::default();

        assert_eq!(query(&backend).page(0).spec().page, 1);
        assert_eq!(query(&backend).page(-7).spec().page, 1);
        assert_eq!(query(&backend).page(4).spec().page, 4);
    }

    #[test]
    fn setters_accumulate() {
        let backend = ScriptedBackend::default();
        let query = query(&backend)
            .select(doc! { "name": 1 })
            .filter(doc! { "active": true })
            .sort("name", SortDirection::Desc)
            .limit(5)
            .page(2);

        assert_eq!(
            query.spec(),
            &PageSpec {
                filter: Some(doc! { "active": true }),
                projection: Some(doc! { "name": 1 }),
                sort_field: Some("name".to_string()),
                sort_direction: Some(SortDirection::Desc),
                limit: 5,
                page: 2,
            }
        );
    }

    #[test]
    fn validate_rejects_unset_or_bypassed_values() {
        assert!(matches!(PageSpec::default().validate(), Err(PagingError::PageLimit)));
        assert!(matches!(
            PageSpec { limit: 10, page: 0, ..Default::default() }.validate(),
            Err(PagingError::PageLimit)
        ));
        assert!(matches!(
            PageSpec { limit: -1, page: 1, ..Default::default() }.validate(),
            Err(PagingError::PageLimit)
        ));
        assert!(PageSpec { limit: 10, page: 1, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn sort_document_requires_field_and_direction() {
        let mut spec = PageSpec::default();
        assert_eq!(spec.sort_document(), None);

        spec.sort_field = Some(String::new());
        spec.sort_direction = Some(SortDirection::Asc);
        assert_eq!(spec.sort_document(), None);

        spec.sort_field = Some("age".to_string());
        assert_eq!(spec.sort_document(), Some(doc! { "age": 1 }));
    }

    #[test]
    fn sort_direction_from_integer() {
        assert_eq!(SortDirection::try_from(1), Ok(SortDirection::Asc));
        assert_eq!(SortDirection::try_from(-1), Ok(SortDirection::Desc));
        assert_eq!(SortDirection::try_from(0), Err(0));
    }
}

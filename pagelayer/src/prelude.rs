//! Convenient re-exports of commonly used types from pagelayer.
//!
//! ```ignore
//! use pagelayer::prelude::*;
//! ```

pub use pagelayer_core::{
    backend::{DocumentCursor, FindRequest, PagingBackend, PagingBackendBuilder},
    collection::Collection,
    error::{PagingError, PagingResult},
    page::{Page, PaginationMetadata},
    query::{PageSpec, PagingQuery, SortDirection},
    store::PagingStore,
};

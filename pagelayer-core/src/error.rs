//! Error types and result types for paging operations.
//!
//! Configuration errors ([`PagingError::PageLimit`], [`PagingError::FilterInAggregate`],
//! [`PagingError::NilFilter`]) are detected before the backend is contacted. Everything the
//! backend reports is carried through [`PagingError::Backend`] with its original cause.
//! Use [`PagingResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Boxed cause of a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents all possible errors that can occur while paging through a collection.
#[derive(Error, Debug)]
pub enum PagingError {
    /// The page or the limit resolved to a value below 1.
    #[error("page or limit cannot be less than 0")]
    PageLimit,
    /// A filter was set on a query executed in aggregate mode.
    #[error("you cannot use filter in aggregate query but you can pass multiple filter as param in aggregate function")]
    FilterInAggregate,
    /// A query was executed in find mode without a filter.
    #[error("filter query cannot be nil")]
    NilFilter,
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The backend failed to run the query. The original cause is preserved.
    #[error(transparent)]
    Backend(BoxError),
}

impl PagingError {
    /// Wraps a backend failure, keeping the original error as the cause.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        PagingError::Backend(err.into())
    }

    /// Returns `true` for errors caused by the query configuration rather than by its execution.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PagingError::PageLimit | PagingError::FilterInAggregate | PagingError::NilFilter
        )
    }
}

/// A specialized `Result` type for paging operations.
pub type PagingResult<T> = Result<T, PagingError>;

impl From<BsonError> for PagingError {
    fn from(err: BsonError) -> Self {
        PagingError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for PagingError {
    fn from(err: SerdeJsonError) -> Self {
        PagingError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_messages_match_the_error_kinds() {
        assert_eq!(PagingError::PageLimit.to_string(), "page or limit cannot be less than 0");
        assert_eq!(PagingError::NilFilter.to_string(), "filter query cannot be nil");
        assert!(PagingError::FilterInAggregate.to_string().starts_with("you cannot use filter"));
    }

    #[test]
    fn backend_errors_are_transparent() {
        let err = PagingError::backend("connection refused");

        assert_eq!(err.to_string(), "connection refused");
        assert!(!err.is_configuration());
        assert!(PagingError::NilFilter.is_configuration());
    }
}

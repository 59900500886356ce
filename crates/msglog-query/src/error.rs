//! Error types for the query crate.

/// Errors that can occur while computing a page.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    /// A page size of zero cannot partition the feed.
    #[error("page size must be positive, got {0}")]
    InvalidPageSize(usize),
}

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, QueryError>;

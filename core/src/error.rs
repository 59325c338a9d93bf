use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors that abort a search call.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no conditions to search")]
    EmptyQuery,

    #[error("duplicate condition key: {0}")]
    DuplicateKey(String),

    #[error("none of the query conditions are present in the index")]
    NoKnownTerms,

    /// The call ran past its deadline. Partial results are discarded.
    #[error("search exceeded its deadline of {limit:?}")]
    Timeout { limit: Duration },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl SearchError {
    /// True for errors caused by the shape of the query rather than the engine.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, SearchError::EmptyQuery | SearchError::DuplicateKey(_) | SearchError::NoKnownTerms)
    }
}

/// Failure reported by a temporal predicate. Never aborts a search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("validity range starts at {start} but ends earlier at {end}")]
    InvertedRange { start: OffsetDateTime, end: OffsetDateTime },

    #[error("predicate failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn display_names_the_duplicate_key() {
        let err = SearchError::DuplicateKey("region".into());
        assert_eq!(err.to_string(), "duplicate condition key: region");
    }

    #[test]
    fn only_validation_errors_are_invalid_queries() {
        assert!(SearchError::EmptyQuery.is_invalid_query());
        assert!(SearchError::NoKnownTerms.is_invalid_query());
        assert!(!SearchError::Timeout { limit: Duration::from_millis(5) }.is_invalid_query());
    }

    #[test]
    fn inverted_range_mentions_both_bounds() {
        let err = PredicateError::InvertedRange {
            start: datetime!(2024-02-01 0:00 UTC),
            end: datetime!(2024-01-01 0:00 UTC),
        };
        let msg = err.to_string();
        assert!(msg.contains("2024-02-01"));
        assert!(msg.contains("2024-01-01"));
    }
}

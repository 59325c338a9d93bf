use crate::error::PredicateError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use time::OffsetDateTime;

/// Outcome of a temporal predicate. `error` is a diagnostic only: inclusion
/// is decided by `valid` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub error: Option<PredicateError>,
}

impl Verdict {
    pub fn valid() -> Self { Self { valid: true, error: None } }
    pub fn invalid() -> Self { Self { valid: false, error: None } }
}

/// Reports whether a document is in effect at `now`.
pub trait TemporalPredicate: Send + Sync + Debug {
    fn is_currently_valid(&self, now: OffsetDateTime) -> Verdict;
}

/// Half-open validity window `[start, end)`. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl TimeRange {
    pub fn new(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self { Self::default() }

    pub fn covers(&self, at: OffsetDateTime) -> bool {
        self.start.map_or(true, |s| s <= at) && self.end.map_or(true, |e| at < e)
    }
}

impl TemporalPredicate for TimeRange {
    fn is_currently_valid(&self, now: OffsetDateTime) -> Verdict {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Verdict { valid: false, error: Some(PredicateError::InvertedRange { start, end }) };
            }
        }
        if self.covers(now) { Verdict::valid() } else { Verdict::invalid() }
    }
}

/// Predicate for documents with no temporal restriction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl TemporalPredicate for Always {
    fn is_currently_valid(&self, _now: OffsetDateTime) -> Verdict { Verdict::valid() }
}

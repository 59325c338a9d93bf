//! Boolean-expression (DNF) matching over a pre-built conjunction index.
//!
//! A query is a set of `key=value` conditions. Every stored conjunction whose
//! terms are all present in the query matches, and the documents attached to
//! matched conjunctions are returned after a temporal validity check.

pub mod builder;
pub mod config;
pub mod error;
pub mod index;
pub mod matcher;
pub mod query;
pub mod resolver;
pub mod search;
pub mod set;
pub mod validity;

pub type TermId = u32;
pub type ConjId = u32;
pub type DocId = u32;

/// Pseudo-term the size-0 (wildcard) conjunction is indexed under.
/// Dictionary term ids start right after it.
pub const EMPTY_TERM: TermId = 0;

pub use builder::IndexBuilder;
pub use config::SearchConfig;
pub use error::{PredicateError, SearchError};
pub use index::{IndexHandle, IndexSnapshot};
pub use query::Condition;
pub use resolver::{Deadline, ResolveContext};
pub use search::{search_snapshot, Searcher};
pub use validity::{Always, TemporalPredicate, TimeRange, Verdict};

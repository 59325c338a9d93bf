use crate::error::SearchError;
use crate::index::TermDictionary;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One `key=value` condition of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub value: String,
}

impl Condition {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Reject empty queries and repeated keys.
pub fn validate(conditions: &[Condition]) -> Result<(), SearchError> {
    if conditions.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let mut seen = HashSet::with_capacity(conditions.len());
    for c in conditions {
        if !seen.insert(c.key.as_str()) {
            return Err(SearchError::DuplicateKey(c.key.clone()));
        }
    }
    Ok(())
}

/// Validate `conditions` and resolve them to term ids. Conditions missing from
/// the dictionary are dropped; if none remain the query cannot match anything.
pub fn translate(dictionary: &TermDictionary, conditions: &[Condition]) -> Result<Vec<TermId>, SearchError> {
    validate(conditions)?;
    let terms: Vec<TermId> = conditions
        .iter()
        .filter_map(|c| dictionary.lookup(&c.key, &c.value))
        .collect();
    if terms.is_empty() {
        return Err(SearchError::NoKnownTerms);
    }
    Ok(terms)
}

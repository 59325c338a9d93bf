use crate::ConjId;
use std::collections::HashMap;

/// Per-pass hit counter. A key matches once its count reaches `threshold`.
///
/// Allocated fresh for every size bucket of every search, never shared
/// between calls.
#[derive(Debug)]
pub struct CountSet {
    threshold: u32,
    hits: HashMap<ConjId, u32>,
    skipped: usize,
}

impl CountSet {
    pub fn new(threshold: u32) -> Self {
        Self { threshold, hits: HashMap::new(), skipped: 0 }
    }

    /// Record one hit for `id`. Entries whose membership flag is unset do not
    /// count toward a match; they are tallied in [`CountSet::skipped`].
    pub fn add(&mut self, id: ConjId, belong: bool) {
        if !belong {
            self.skipped += 1;
            return;
        }
        *self.hits.entry(id).or_insert(0) += 1;
    }

    /// Number of non-counting membership entries seen in this pass.
    pub fn skipped(&self) -> usize { self.skipped }

    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    /// Keys whose accumulated count reached the threshold, in no particular order.
    pub fn into_matches(self) -> impl Iterator<Item = ConjId> {
        let threshold = self.threshold;
        self.hits.into_iter().filter(move |&(_, n)| n >= threshold).map(|(id, _)| id)
    }
}

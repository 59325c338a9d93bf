use crate::validity::TemporalPredicate;
use crate::{ConjId, DocId, TermId, EMPTY_TERM};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps `(key, value)` attribute pairs to term ids.
#[derive(Debug, Default, Clone)]
pub struct TermDictionary {
    terms: HashMap<String, HashMap<String, TermId>>,
    len: usize,
}

impl TermDictionary {
    pub fn lookup(&self, key: &str, value: &str) -> Option<TermId> {
        self.terms.get(key)?.get(value).copied()
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub(crate) fn insert(&mut self, key: &str, value: &str, id: TermId) {
        let prev = self.terms.entry(key.to_string()).or_default().insert(value.to_string(), id);
        if prev.is_none() {
            self.len += 1;
        }
    }
}

/// One conjunction listed under a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub conj_id: ConjId,
    /// Whether the entry counts toward satisfying the conjunction.
    pub belong: bool,
}

/// All conjunctions of one size that contain `term_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term_id: TermId,
    pub conjs: Vec<Membership>,
}

/// Conjunctions bucketed by term count. Each bucket is sorted by ascending term id.
#[derive(Debug, Default, Clone)]
pub struct SizeIndex {
    buckets: Vec<Vec<TermEntry>>,
}

impl SizeIndex {
    pub(crate) fn from_buckets(buckets: Vec<Vec<TermEntry>>) -> Self {
        debug_assert!(buckets
            .iter()
            .all(|b| b.windows(2).all(|w| w[0].term_id < w[1].term_id)));
        Self { buckets }
    }

    /// One past the largest populated conjunction size; 0 for an empty index.
    pub fn bucket_count(&self) -> usize { self.buckets.len() }

    pub fn entries(&self, size: usize) -> &[TermEntry] {
        self.buckets.get(size).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Binary search for `term` in the bucket for `size`.
    pub fn find(&self, size: usize, term: TermId) -> Option<&[Membership]> {
        let entries = self.entries(size);
        entries
            .binary_search_by_key(&term, |e| e.term_id)
            .ok()
            .map(|i| entries[i].conjs.as_slice())
    }

    /// Size-0 conjunctions, which match every query.
    pub fn wildcard(&self) -> &[Membership] {
        self.find(0, EMPTY_TERM).unwrap_or(&[])
    }
}

/// Conjunction id -> attached documents.
#[derive(Debug, Default, Clone)]
pub struct ConjunctionDocs {
    docs: Vec<Vec<DocId>>,
}

impl ConjunctionDocs {
    pub(crate) fn new(docs: Vec<Vec<DocId>>) -> Self { Self { docs } }

    /// Empty for unknown conjunctions.
    pub fn documents_of(&self, conj: ConjId) -> &[DocId] {
        self.docs.get(conj as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

#[derive(Debug, Clone)]
pub struct DocAttrs {
    pub validity: Arc<dyn TemporalPredicate>,
}

#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    docs: HashMap<DocId, DocAttrs>,
}

impl DocumentStore {
    pub fn attributes(&self, doc: DocId) -> Option<&DocAttrs> { self.docs.get(&doc) }
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub(crate) fn insert(&mut self, doc: DocId, attrs: DocAttrs) { self.docs.insert(doc, attrs); }
}

/// One immutable generation of every index a search reads.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub generation: u64,
    pub dictionary: TermDictionary,
    pub sizes: SizeIndex,
    pub conj_docs: ConjunctionDocs,
    pub documents: DocumentStore,
}

/// Shared handle to the current snapshot. Readers hold the lock only while
/// cloning the `Arc`; the writer swaps whole generations.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl IndexHandle {
    pub fn new(snapshot: IndexSnapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> { self.current.read().clone() }

    pub fn generation(&self) -> u64 { self.current.read().generation }

    /// Replace the current snapshot, stamping it with the next generation, and
    /// return the snapshot that was installed. Searches already holding the
    /// previous snapshot finish against it.
    pub fn publish(&self, mut next: IndexSnapshot) -> Arc<IndexSnapshot> {
        let mut current = self.current.write();
        next.generation = current.generation + 1;
        let installed = Arc::new(next);
        *current = installed.clone();
        tracing::info!(generation = installed.generation, "published index snapshot");
        installed
    }
}

use crate::index::{
    ConjunctionDocs, DocAttrs, DocumentStore, IndexSnapshot, Membership, SizeIndex, TermDictionary, TermEntry,
};
use crate::validity::TemporalPredicate;
use crate::{ConjId, DocId, TermId, EMPTY_TERM};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Writer-side assembly of an [`IndexSnapshot`] from already-compiled
/// conjunctions. Each conjunction is given as its `(key, value)` terms; an
/// empty list is the wildcard conjunction.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    dictionary: TermDictionary,
    next_term_id: TermId,
    // sorted, distinct term ids -> conjunction id
    conj_ids: HashMap<Vec<TermId>, ConjId>,
    conjunctions: Vec<Vec<TermId>>,
    conj_docs: Vec<Vec<DocId>>,
    documents: DocumentStore,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self { next_term_id: EMPTY_TERM + 1, ..Self::default() }
    }

    /// Intern a conjunction, returning its id. The same term set always maps
    /// to the same id; repeated terms collapse.
    pub fn add_conjunction<K, V>(&mut self, terms: &[(K, V)]) -> ConjId
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ids: Vec<TermId> = terms.iter().map(|(k, v)| self.intern_term(k.as_ref(), v.as_ref())).collect();
        ids.sort_unstable();
        ids.dedup();
        if let Some(&id) = self.conj_ids.get(&ids) {
            return id;
        }
        let id = self.conjunctions.len() as ConjId;
        self.conj_ids.insert(ids.clone(), id);
        self.conjunctions.push(ids);
        self.conj_docs.push(Vec::new());
        id
    }

    /// Register a document and its validity predicate. Re-adding replaces the predicate.
    pub fn add_document(&mut self, doc: DocId, validity: Arc<dyn TemporalPredicate>) {
        self.documents.insert(doc, DocAttrs { validity });
    }

    /// Attach `doc` to `conj`. Unknown conjunction ids are ignored.
    pub fn attach(&mut self, conj: ConjId, doc: DocId) {
        match self.conj_docs.get_mut(conj as usize) {
            Some(list) => list.push(doc),
            None => tracing::warn!(conj, doc, "attach to unknown conjunction ignored"),
        }
    }

    /// Convenience: register `doc` as satisfied by any of `conjunctions`.
    pub fn add_document_with<K, V>(
        &mut self,
        doc: DocId,
        validity: Arc<dyn TemporalPredicate>,
        conjunctions: &[Vec<(K, V)>],
    ) where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_document(doc, validity);
        for terms in conjunctions {
            let conj = self.add_conjunction(terms);
            self.attach(conj, doc);
        }
    }

    pub fn build(mut self) -> IndexSnapshot {
        for list in &mut self.conj_docs {
            list.sort_unstable();
            list.dedup();
        }
        let max_size = self.conjunctions.iter().map(Vec::len).max();
        let bucket_count = max_size.map_or(0, |m| m + 1);
        let mut buckets: Vec<BTreeMap<TermId, Vec<Membership>>> = vec![BTreeMap::new(); bucket_count];

        for (conj_id, terms) in self.conjunctions.iter().enumerate() {
            let conj_id = conj_id as ConjId;
            let bucket = &mut buckets[terms.len()];
            if terms.is_empty() {
                bucket.entry(EMPTY_TERM).or_default().push(Membership { conj_id, belong: true });
            }
            for &term_id in terms {
                bucket.entry(term_id).or_default().push(Membership { conj_id, belong: true });
            }
        }

        let buckets = buckets
            .into_iter()
            .map(|b| b.into_iter().map(|(term_id, conjs)| TermEntry { term_id, conjs }).collect())
            .collect();

        tracing::debug!(
            terms = self.dictionary.len(),
            conjunctions = self.conjunctions.len(),
            documents = self.documents.len(),
            bucket_count,
            "built index snapshot"
        );

        IndexSnapshot {
            generation: 0,
            dictionary: self.dictionary,
            sizes: SizeIndex::from_buckets(buckets),
            conj_docs: ConjunctionDocs::new(self.conj_docs),
            documents: self.documents,
        }
    }

    fn intern_term(&mut self, key: &str, value: &str) -> TermId {
        if let Some(id) = self.dictionary.lookup(key, value) {
            return id;
        }
        let id = self.next_term_id;
        self.next_term_id += 1;
        self.dictionary.insert(key, value, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity::Always;

    #[test]
    fn term_ids_start_after_empty_term() {
        let mut b = IndexBuilder::new();
        b.add_conjunction(&[("a", "1"), ("b", "2")]);
        let snap = b.build();
        assert_eq!(snap.dictionary.lookup("a", "1"), Some(1));
        assert_eq!(snap.dictionary.lookup("b", "2"), Some(2));
    }

    #[test]
    fn identical_term_sets_share_a_conjunction() {
        let mut b = IndexBuilder::new();
        let c1 = b.add_conjunction(&[("a", "1"), ("b", "2")]);
        let c2 = b.add_conjunction(&[("b", "2"), ("a", "1"), ("a", "1")]);
        assert_eq!(c1, c2);
    }

    #[test]
    fn buckets_are_keyed_by_size_and_sorted() {
        let mut b = IndexBuilder::new();
        let wild = b.add_conjunction::<&str, &str>(&[]);
        let pair = b.add_conjunction(&[("z", "9"), ("a", "1")]);
        let single = b.add_conjunction(&[("z", "9")]);
        let snap = b.build();

        assert_eq!(snap.sizes.bucket_count(), 3);
        assert_eq!(snap.sizes.wildcard(), &[Membership { conj_id: wild, belong: true }]);
        let z = snap.dictionary.lookup("z", "9").unwrap();
        assert_eq!(snap.sizes.find(1, z).unwrap()[0].conj_id, single);
        let ids: Vec<TermId> = snap.sizes.entries(2).iter().map(|e| e.term_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(snap.sizes.find(2, 1).unwrap()[0].conj_id, pair);
    }

    #[test]
    fn attach_deduplicates_documents() {
        let mut b = IndexBuilder::new();
        b.add_document_with(100, Arc::new(Always), &[vec![("a", "1")], vec![("a", "1")]]);
        let snap = b.build();
        assert_eq!(snap.conj_docs.documents_of(0), &[100]);
        assert!(snap.documents.attributes(100).is_some());
    }

    #[test]
    fn empty_builder_has_no_buckets() {
        let snap = IndexBuilder::new().build();
        assert_eq!(snap.sizes.bucket_count(), 0);
        assert!(snap.sizes.wildcard().is_empty());
    }
}

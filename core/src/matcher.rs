use crate::index::SizeIndex;
use crate::set::CountSet;
use crate::TermId;
use roaring::RoaringBitmap;

/// Every conjunction whose terms are all among `terms`.
///
/// A conjunction of size `i` lives in bucket `i` and matches when exactly `i`
/// of the query's terms hit it, so buckets larger than the query are never
/// visited. Bucket 0 holds the wildcard conjunctions, which always match.
/// `terms` must be distinct.
pub fn match_conjunctions(index: &SizeIndex, terms: &[TermId]) -> RoaringBitmap {
    let mut matched = RoaringBitmap::new();
    let Some(last_bucket) = index.bucket_count().checked_sub(1) else {
        return matched;
    };
    let n = terms.len().min(last_bucket);

    for size in 0..=n {
        if index.entries(size).is_empty() {
            continue;
        }
        let mut counts = CountSet::new(size as u32);
        for &term in terms {
            if let Some(conjs) = index.find(size, term) {
                for m in conjs {
                    counts.add(m.conj_id, m.belong);
                }
            }
        }
        if size == 0 {
            for m in index.wildcard() {
                debug_assert!(m.belong, "wildcard membership must count");
                counts.add(m.conj_id, m.belong);
            }
        }
        if counts.skipped() > 0 {
            tracing::warn!(size, skipped = counts.skipped(), "ignored non-counting membership entries");
        }
        matched.extend(counts.into_matches());
    }
    matched
}

use crate::error::SearchError;
use crate::index::IndexSnapshot;
use crate::DocId;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Per-call settings for document resolution.
pub struct ResolveContext<'a> {
    /// Validity is judged as of this instant for every candidate.
    pub now: OffsetDateTime,
    pub deadline: Option<Deadline>,
    /// Candidate counts at or below this skip the pool.
    pub sequential_threshold: usize,
    pub pool: Option<&'a rayon::ThreadPool>,
}

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub at: Instant,
    pub limit: Duration,
}

impl Deadline {
    pub fn after(started: Instant, limit: Duration) -> Self {
        Self { at: started + limit, limit }
    }

    pub fn check(&self) -> Result<(), SearchError> {
        if Instant::now() >= self.at {
            return Err(SearchError::Timeout { limit: self.limit });
        }
        Ok(())
    }
}

/// Documents of `conjs` whose temporal predicate is currently valid,
/// ascending and without duplicates.
pub fn resolve_documents(
    snapshot: &IndexSnapshot,
    conjs: &RoaringBitmap,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<DocId>, SearchError> {
    let mut candidates = RoaringBitmap::new();
    for conj in conjs {
        candidates.extend(snapshot.conj_docs.documents_of(conj).iter().copied());
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(deadline) = &ctx.deadline {
        deadline.check()?;
    }

    let candidates: Vec<DocId> = candidates.into_iter().collect();
    let expired = AtomicBool::new(false);
    let keep = |&doc: &DocId| {
        if let Some(deadline) = &ctx.deadline {
            if deadline.check().is_err() {
                expired.store(true, Ordering::Relaxed);
                return false;
            }
        }
        is_valid(snapshot, doc, ctx.now)
    };

    let valid: Vec<DocId> = match ctx.pool {
        Some(pool) if candidates.len() > ctx.sequential_threshold => {
            pool.install(|| candidates.par_iter().copied().filter(|d| keep(d)).collect::<Vec<_>>())
        }
        _ => candidates.iter().copied().filter(|d| keep(d)).collect(),
    };

    if expired.load(Ordering::Relaxed) {
        if let Some(deadline) = ctx.deadline {
            return Err(SearchError::Timeout { limit: deadline.limit });
        }
    }
    Ok(valid)
}

fn is_valid(snapshot: &IndexSnapshot, doc: DocId, now: OffsetDateTime) -> bool {
    let Some(attrs) = snapshot.documents.attributes(doc) else {
        tracing::warn!(doc_id = doc, "conjunction references a document missing from the store");
        return false;
    };
    let verdict = attrs.validity.is_currently_valid(now);
    if let Some(err) = &verdict.error {
        tracing::warn!(doc_id = doc, error = %err, "temporal predicate failed");
    }
    verdict.valid
}

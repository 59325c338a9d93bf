use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::index::{IndexHandle, IndexSnapshot};
use crate::matcher::match_conjunctions;
use crate::query::{translate, Condition};
use crate::resolver::{resolve_documents, Deadline, ResolveContext};
use crate::DocId;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;

/// Entry point for matching queries against the current index generation.
pub struct Searcher {
    index: Arc<IndexHandle>,
    config: SearchConfig,
    pool: rayon::ThreadPool,
}

impl Searcher {
    pub fn new(index: Arc<IndexHandle>, config: SearchConfig) -> Result<Self, SearchError> {
        let config = config.normalized();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("dnf-resolve-{i}"))
            .build()?;
        Ok(Self { index, config, pool })
    }

    pub fn index(&self) -> &Arc<IndexHandle> { &self.index }
    pub fn config(&self) -> &SearchConfig { &self.config }

    /// Threads available for predicate evaluation.
    pub fn max_workers(&self) -> usize { self.pool.current_num_threads() }

    /// Documents matched by `conditions` and valid right now.
    pub fn search(&self, conditions: &[Condition]) -> Result<Vec<DocId>, SearchError> {
        self.search_at(conditions, OffsetDateTime::now_utc())
    }

    /// Like [`Searcher::search`] with validity judged at `now`. The whole call
    /// reads a single snapshot even if a new generation is published meanwhile.
    pub fn search_at(&self, conditions: &[Condition], now: OffsetDateTime) -> Result<Vec<DocId>, SearchError> {
        let snapshot = self.index.snapshot();
        self.search_in(&snapshot, conditions, now)
    }

    /// Search an explicit snapshot, e.g. one the caller already holds.
    pub fn search_in(
        &self,
        snapshot: &IndexSnapshot,
        conditions: &[Condition],
        now: OffsetDateTime,
    ) -> Result<Vec<DocId>, SearchError> {
        let started = Instant::now();
        let ctx = ResolveContext {
            now,
            deadline: self.config.timeout.map(|limit| Deadline::after(started, limit)),
            sequential_threshold: self.config.sequential_threshold,
            pool: Some(&self.pool),
        };
        search_snapshot(snapshot, conditions, &ctx)
    }
}

/// Translate, match and resolve `conditions` against one snapshot.
pub fn search_snapshot(
    snapshot: &IndexSnapshot,
    conditions: &[Condition],
    ctx: &ResolveContext<'_>,
) -> Result<Vec<DocId>, SearchError> {
    let started = Instant::now();
    let terms = translate(&snapshot.dictionary, conditions)?;
    let conjs = match_conjunctions(&snapshot.sizes, &terms);
    if conjs.is_empty() {
        tracing::debug!(generation = snapshot.generation, terms = terms.len(), "no conjunction matched");
        return Ok(Vec::new());
    }
    let docs = resolve_documents(snapshot, &conjs, ctx)?;
    tracing::debug!(
        generation = snapshot.generation,
        terms = terms.len(),
        conjunctions = conjs.len(),
        documents = docs.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "search complete"
    );
    Ok(docs)
}

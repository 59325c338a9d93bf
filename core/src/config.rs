use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SEQUENTIAL_THRESHOLD: usize = 64;

/// Tuning for document resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on concurrent predicate evaluations.
    pub max_workers: usize,
    /// Candidate counts at or below this are evaluated on the calling thread.
    pub sequential_threshold: usize,
    /// Deadline for a whole search call.
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            sequential_threshold: DEFAULT_SEQUENTIAL_THRESHOLD,
            timeout: None,
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by `DNF_MAX_WORKERS`, `DNF_SEQUENTIAL_THRESHOLD` and
    /// `DNF_TIMEOUT_MS`. Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());
        let mut cfg = Self::default();
        if let Some(n) = parse("DNF_MAX_WORKERS") {
            cfg.max_workers = n as usize;
        }
        if let Some(n) = parse("DNF_SEQUENTIAL_THRESHOLD") {
            cfg.sequential_threshold = n as usize;
        }
        if let Some(ms) = parse("DNF_TIMEOUT_MS") {
            cfg.timeout = Some(Duration::from_millis(ms));
        }
        cfg.normalized()
    }

    pub fn with_max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self.normalized()
    }

    pub fn with_sequential_threshold(mut self, n: usize) -> Self {
        self.sequential_threshold = n;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.max_workers = self.max_workers.max(1);
        self
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

use anyhow::{Context, Result};
use dnf::{Condition, IndexBuilder, IndexSnapshot, TimeRange};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Already-compiled documents the index is built from.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    pub documents: Vec<CorpusDoc>,
}

#[derive(Debug, Deserialize)]
pub struct CorpusDoc {
    pub id: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_from: Option<time::OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_until: Option<time::OffsetDateTime>,
    /// The document matches when any of these conjunctions does. `[]` matches everything.
    pub conjunctions: Vec<Vec<Condition>>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
        let corpus: Corpus = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing corpus {}", path.display()))?;
        Ok(corpus)
    }

    pub fn into_snapshot(self) -> IndexSnapshot {
        let mut b = IndexBuilder::new();
        for doc in self.documents {
            b.add_document(doc.id, Arc::new(TimeRange::new(doc.valid_from, doc.valid_until)));
            for conj in &doc.conjunctions {
                let terms: Vec<(&str, &str)> = conj.iter().map(|c| (c.key.as_str(), c.value.as_str())).collect();
                let id = b.add_conjunction(&terms);
                b.attach(id, doc.id);
            }
        }
        b.build()
    }
}

pub fn load_snapshot(path: &Path) -> Result<IndexSnapshot> {
    let corpus = Corpus::load(path)?;
    let docs = corpus.documents.len();
    let snapshot = corpus.into_snapshot();
    tracing::info!(path = %path.display(), docs, terms = snapshot.dictionary.len(), "loaded corpus");
    Ok(snapshot)
}

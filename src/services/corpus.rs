use crate::models::NeighborhoodCorpus;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when loading a corpus snapshot
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate neighborhood id: {0}")]
    DuplicateNeighborhood(String),

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

/// Holds the current read-only corpus snapshot
///
/// Readers take an `Arc` of the snapshot for the duration of one scoring run;
/// a reload swaps in a new snapshot without touching runs already in flight.
pub struct CorpusStore {
    path: PathBuf,
    snapshot: RwLock<Arc<NeighborhoodCorpus>>,
}

impl CorpusStore {
    /// Load the snapshot file at `path`
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let corpus = read_snapshot(&path).await?;

        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(corpus)),
        })
    }

    /// Wrap an in-memory corpus (used by tests and embedders)
    pub fn from_corpus(corpus: NeighborhoodCorpus) -> Result<Self, CorpusError> {
        validate(&corpus)?;
        Ok(Self {
            path: PathBuf::new(),
            snapshot: RwLock::new(Arc::new(corpus)),
        })
    }

    pub async fn snapshot(&self) -> Arc<NeighborhoodCorpus> {
        self.snapshot.read().await.clone()
    }

    /// Re-read the snapshot file and swap it in
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<Arc<NeighborhoodCorpus>, CorpusError> {
        let corpus = Arc::new(read_snapshot(&self.path).await?);
        *self.snapshot.write().await = corpus.clone();

        tracing::info!(
            "Corpus reloaded from {}: {} neighborhoods, {} peer profiles",
            self.path.display(),
            corpus.neighborhoods.len(),
            corpus.peers.len()
        );

        Ok(corpus)
    }
}

async fn read_snapshot(path: &Path) -> Result<NeighborhoodCorpus, CorpusError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CorpusError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let corpus: NeighborhoodCorpus = serde_json::from_slice(&bytes)?;
    validate(&corpus)?;

    Ok(corpus)
}

/// Structural checks the engine relies on: unique ids and completeness in [0, 1]
fn validate(corpus: &NeighborhoodCorpus) -> Result<(), CorpusError> {
    let mut seen = BTreeSet::new();
    for record in &corpus.neighborhoods {
        if !seen.insert(record.id.as_str()) {
            return Err(CorpusError::DuplicateNeighborhood(record.id.clone()));
        }

        for (metric, reading) in &record.metrics {
            if !(0.0..=1.0).contains(&reading.completeness) {
                return Err(CorpusError::InvalidRecord {
                    id: record.id.clone(),
                    reason: format!(
                        "completeness for {} must be within [0, 1], got {}",
                        metric, reading.completeness
                    ),
                });
            }
        }
    }

    Ok(())
}

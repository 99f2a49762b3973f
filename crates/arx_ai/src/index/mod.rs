//! Embedding-based similarity index over evidence records.
//!
//! The index is rebuilt wholesale for every corpus. A build prepares a complete
//! [`IndexSnapshot`] off to the side and publishes it with a single pointer swap, so a concurrent
//! `search` sees either the previous snapshot or the new one.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arx_core::domain::EvidenceRecord;
use arx_core::error::{codes, AppError};
use tracing::{debug, info, warn};

use crate::embeddings::Embedder;

mod similarity;
mod snapshot;

pub use similarity::{dot, l2_norm, normalized};
pub use snapshot::{IndexSnapshot, SnapshotManifest, SnapshotStore};

/// Result of trying to restore a persisted snapshot. Loading never fails outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize, dims: usize },
    Unavailable { reason: String },
}

pub struct SimilarityIndex {
    embedder: Box<dyn Embedder>,
    model: String,
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    build_gate: Mutex<()>,
}

impl SimilarityIndex {
    pub fn new(embedder: Box<dyn Embedder>, model: impl Into<String>) -> Self {
        Self {
            embedder,
            model: model.into(),
            current: RwLock::new(None),
            build_gate: Mutex::new(()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The currently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, next: Option<Arc<IndexSnapshot>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    /// Embed `title + " " + content` for every record, normalize, and replace the index.
    pub fn build(&self, records: &[EvidenceRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            return Err(AppError::new(
                codes::INVALID_INPUT,
                "Cannot build an index from an empty corpus",
            ));
        }
        let _gate = self.build_gate.lock().unwrap_or_else(PoisonError::into_inner);

        let texts: Vec<String> = records.iter().map(EvidenceRecord::embedding_text).collect();
        let raw = self.embedder.embed_batch(&self.model, &texts).map_err(|e| {
            AppError::new("ARX_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                .with_details(format!("records={}; err={}", records.len(), e))
                .with_retryable(e.retryable)
        })?;
        if raw.len() != records.len() {
            return Err(AppError::new(
                "ARX_INDEX_BUILD_FAILED",
                "Embedder returned the wrong number of vectors",
            )
            .with_details(format!("expected={}; got={}", records.len(), raw.len())));
        }

        let mut vectors = Vec::with_capacity(raw.len());
        for (i, v) in raw.iter().enumerate() {
            let unit = normalized(v).ok_or_else(|| {
                AppError::new(
                    "ARX_INDEX_BUILD_FAILED",
                    "Embedding is zero or not finite and cannot be normalized",
                )
                .with_details(format!("position={i}; url={}", records[i].url))
            })?;
            vectors.push(unit);
        }

        let snapshot = IndexSnapshot::from_parts(self.model.clone(), vectors, records.to_vec())?;
        info!(
            records = snapshot.len(),
            dims = snapshot.dims(),
            model = %self.model,
            "similarity index built"
        );
        self.publish(Some(Arc::new(snapshot)));
        Ok(())
    }

    /// Top `top_k` records by cosine similarity to `query`, each carrying its score.
    ///
    /// Ties keep corpus order. An index that was never built yields an empty result.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<EvidenceRecord>, AppError> {
        if top_k == 0 {
            return Err(AppError::new(codes::INVALID_INPUT, "top_k must be at least 1"));
        }
        let Some(snapshot) = self.snapshot() else {
            debug!("search on empty index");
            return Ok(Vec::new());
        };

        let qv = self.embedder.embed(&self.model, query)?;
        if qv.len() != snapshot.dims() {
            return Err(AppError::new(
                "ARX_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", snapshot.dims(), qv.len())));
        }
        let q = normalized(&qv).ok_or_else(|| {
            AppError::new(
                "ARX_RETRIEVAL_FAILED",
                "Query embedding is zero or not finite",
            )
        })?;

        let mut hits: Vec<(usize, f32)> = snapshot
            .vectors()
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&q, v).clamp(-1.0, 1.0)))
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(top_k);

        debug!(hits = hits.len(), top_k, "similarity search");
        Ok(hits
            .into_iter()
            .map(|(i, score)| snapshot.records()[i].with_relevance(score))
            .collect())
    }

    pub fn save(&self, store: &SnapshotStore) -> Result<SnapshotManifest, AppError> {
        let snapshot = self.snapshot().ok_or_else(|| {
            AppError::new(codes::INDEX_UNAVAILABLE, "No index has been built; nothing to save")
        })?;
        let manifest = store.write(&snapshot)?;
        info!(
            path = %store.root().display(),
            records = manifest.count,
            "index snapshot saved"
        );
        Ok(manifest)
    }

    /// Restore a snapshot as one unit. On any problem the index is left empty.
    pub fn load(&self, store: &SnapshotStore) -> LoadOutcome {
        match store.read(&self.model) {
            Ok(snapshot) => {
                let outcome = LoadOutcome::Loaded {
                    count: snapshot.len(),
                    dims: snapshot.dims(),
                };
                self.publish(Some(Arc::new(snapshot)));
                info!(path = %store.root().display(), "index snapshot loaded");
                outcome
            }
            Err(e) => {
                self.clear();
                warn!(
                    path = %store.root().display(),
                    error = %e,
                    "no index snapshot available"
                );
                LoadOutcome::Unavailable {
                    reason: e.message,
                }
            }
        }
    }
}

//! End-to-end run for one topic: evidence, index, retrieval, drafting, scoring, report.

use arx_core::error::{codes, AppError};
use arx_core::report::{assemble_report, ReportInput, RunReport};
use arx_core::scoring::ArgumentScorer;
use tracing::{info, warn};

use crate::draft::ArgumentGenerator;
use crate::index::{LoadOutcome, SimilarityIndex, SnapshotStore};
use crate::providers::EvidenceAggregator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub per_provider_limit: usize,
    /// Search the already-loaded index instead of rebuilding it on the new corpus.
    pub reuse_cached_index: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            per_provider_limit: 5,
            reuse_cached_index: false,
        }
    }
}

pub struct PipelineParts {
    pub aggregator: EvidenceAggregator,
    pub index: SimilarityIndex,
    pub generator: ArgumentGenerator,
    pub scorer: ArgumentScorer,
    pub store: Option<SnapshotStore>,
}

pub struct ArgumentPipeline {
    aggregator: EvidenceAggregator,
    index: SimilarityIndex,
    generator: ArgumentGenerator,
    scorer: ArgumentScorer,
    store: Option<SnapshotStore>,
    settings: PipelineSettings,
}

impl ArgumentPipeline {
    /// Attempts one snapshot load from `parts.store`. A missing snapshot is not an error.
    pub fn new(parts: PipelineParts, settings: PipelineSettings) -> Self {
        if let Some(store) = parts.store.as_ref() {
            match parts.index.load(store) {
                LoadOutcome::Loaded { count, dims } => {
                    info!(count, dims, "restored index snapshot")
                }
                LoadOutcome::Unavailable { reason } => {
                    info!(%reason, "no usable index snapshot; will build on first run")
                }
            }
        }
        Self {
            aggregator: parts.aggregator,
            index: parts.index,
            generator: parts.generator,
            scorer: parts.scorer,
            store: parts.store,
            settings,
        }
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn run(&self, topic: &str, generated_at: &str) -> Result<RunReport, AppError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::new(codes::INVALID_INPUT, "Topic must not be empty"));
        }

        let corpus = self.aggregator.collect(topic, self.settings.per_provider_limit);
        info!(topic, count = corpus.len(), "collected evidence");
        if corpus.is_empty() {
            return Err(AppError::new(codes::NO_EVIDENCE, "No evidence found for this topic")
                .with_details(format!("topic={topic}")));
        }

        let index_reused = self.settings.reuse_cached_index && self.index.is_ready();
        if !index_reused {
            self.index.build(&corpus)?;
            if let Some(store) = self.store.as_ref() {
                if let Err(e) = self.index.save(store) {
                    warn!(code = %e.code, error = %e, "failed to persist index snapshot");
                }
            }
        }

        let relevant = self.index.search(topic, self.settings.top_k)?;
        info!(count = relevant.len(), reused = index_reused, "retrieved relevant evidence");

        let (pro, con) = self.generator.generate_pro_con(topic, &relevant);
        let pro_eval = self.scorer.evaluate(&pro);
        let con_eval = self.scorer.evaluate(&con);

        Ok(assemble_report(ReportInput {
            topic,
            pro: (&pro, &pro_eval),
            con: (&con, &con_eval),
            sources_used: &relevant,
            total_sources_retrieved: corpus.len(),
            generated_at,
            model_used: self.generator.model(),
            index_reused,
        }))
    }
}

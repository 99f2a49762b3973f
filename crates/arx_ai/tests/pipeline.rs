use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arx_ai::draft::ArgumentGenerator;
use arx_ai::embeddings::Embedder;
use arx_ai::index::{SimilarityIndex, SnapshotStore};
use arx_ai::judge::LlmJudge;
use arx_ai::llm::Llm;
use arx_ai::pipeline::{ArgumentPipeline, PipelineParts, PipelineSettings};
use arx_ai::providers::{EvidenceAggregator, EvidenceProvider};
use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use arx_core::scoring::ArgumentScorer;

struct CountABEmbedder {
    calls: Arc<AtomicUsize>,
}

impl Embedder for CountABEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let a = input.chars().filter(|c| *c == 'a').count();
        let b = input.chars().filter(|c| *c == 'b').count();
        Ok(vec![a as f32 + 0.5, b as f32])
    }
}

struct StaticProvider(Vec<EvidenceRecord>);

impl EvidenceProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn search_evidence(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        Ok(self.0.clone())
    }
}

/// Answers drafting prompts with a fixed argument and judge prompts with fixed scores.
struct ScriptedLlm;

impl Llm for ScriptedLlm {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, AppError> {
        if prompt.contains("expert argument evaluator") {
            Ok(
                "Clarity: 1.0\nLogic: 1.0\nEvidence: 1.0\nPersuasiveness: 1.0\nFeedback: Solid."
                    .to_string(),
            )
        } else {
            Ok("According to Source 1, adoption grows because fees fall.".to_string())
        }
    }
}

struct DownLlm;

impl Llm for DownLlm {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::new("ARX_GENERATION_FAILED", "offline"))
    }
}

fn corpus() -> Vec<EvidenceRecord> {
    ["aaaa", "abab", "bbbb", "aab", "b"]
        .iter()
        .enumerate()
        .map(|(i, c)| {
            EvidenceRecord::new(
                format!("https://e.example/{i}"),
                format!("T{i}"),
                *c,
                SourceKind::Blog,
                "2025-01-01",
            )
        })
        .collect()
}

fn parts(
    llm: fn() -> Box<dyn Llm>,
    calls: Arc<AtomicUsize>,
    store: Option<SnapshotStore>,
    judged: bool,
) -> PipelineParts {
    let scorer = if judged {
        ArgumentScorer::with_external(Box::new(LlmJudge::new(llm(), "judge")))
    } else {
        ArgumentScorer::rule_based()
    };
    PipelineParts {
        aggregator: EvidenceAggregator::new(vec![Box::new(StaticProvider(corpus()))]),
        index: SimilarityIndex::new(Box::new(CountABEmbedder { calls }), "mock-embed"),
        generator: ArgumentGenerator::new(llm(), "mock-llm").with_limits(2, 100),
        scorer,
        store,
    }
}

fn scripted() -> Box<dyn Llm> {
    Box::new(ScriptedLlm)
}

fn down() -> Box<dyn Llm> {
    Box::new(DownLlm)
}

const AT: &str = "2025-06-01T12:30:05Z";

#[test]
fn empty_topic_is_invalid_input() {
    let pipeline = ArgumentPipeline::new(
        parts(scripted, Arc::new(AtomicUsize::new(0)), None, false),
        PipelineSettings::default(),
    );
    let err = pipeline.run("   ", AT).expect_err("empty topic");
    assert_eq!(err.code, "ARX_INVALID_INPUT");
}

#[test]
fn run_produces_a_complete_report() {
    let settings = PipelineSettings {
        top_k: 3,
        ..PipelineSettings::default()
    };
    let pipeline = ArgumentPipeline::new(
        parts(scripted, Arc::new(AtomicUsize::new(0)), None, true),
        settings,
    );
    let report = pipeline.run("aaa", AT).expect("run");

    assert_eq!(report.topic, "aaa");
    assert_eq!(report.metadata.total_sources_retrieved, 5);
    assert_eq!(report.metadata.sources_used, 3);
    assert_eq!(report.metadata.generated_at, AT);
    assert_eq!(report.metadata.model_used, "mock-llm");
    assert!(!report.metadata.index_reused);

    assert_eq!(report.sources.len(), 3);
    assert_eq!(report.sources[0].url, "https://e.example/0");
    assert_eq!(report.sources[0].id, 1);
    for pair in report.sources.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }

    let pro = &report.arguments.pro;
    assert_eq!(pro.confidence_score, 0.8);
    assert_eq!(pro.citations, vec!["[1] T0 - https://e.example/0".to_string()]);
    assert_eq!(pro.evaluation.feedback, "Solid.");
    let e = &pro.evaluation;
    let mean = (e.clarity + e.logic + e.evidence + e.persuasiveness) / 4.0;
    assert!((e.overall_score - mean).abs() <= 0.011);
}

#[test]
fn generation_failure_still_completes_the_report() {
    let pipeline = ArgumentPipeline::new(
        parts(down, Arc::new(AtomicUsize::new(0)), None, true),
        PipelineSettings::default(),
    );
    let report = pipeline.run("bitcoin", AT).expect("run");
    assert_eq!(report.arguments.pro.confidence_score, 0.0);
    assert_eq!(
        report.arguments.con.content,
        "Unable to generate con argument due to API error."
    );
    // Judge is down too, so the metrics are the rule-based ones.
    assert!(!report.arguments.pro.evaluation.feedback.is_empty());
}

#[test]
fn snapshot_is_persisted_and_reused_on_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());

    let first_calls = Arc::new(AtomicUsize::new(0));
    let first = ArgumentPipeline::new(
        parts(scripted, first_calls.clone(), Some(store.clone()), false),
        PipelineSettings::default(),
    );
    first.run("aab", AT).expect("first run");
    assert!(store.manifest_path().exists());
    // 5 records plus the query.
    assert_eq!(first_calls.load(Ordering::SeqCst), 6);

    let second_calls = Arc::new(AtomicUsize::new(0));
    let second = ArgumentPipeline::new(
        parts(scripted, second_calls.clone(), Some(store), false),
        PipelineSettings {
            reuse_cached_index: true,
            ..PipelineSettings::default()
        },
    );
    assert!(second.index().is_ready());
    let report = second.run("aab", AT).expect("second run");
    assert!(report.metadata.index_reused);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

use std::fs;
use std::path::{Path, PathBuf};

use arx_ai::draft::ArgumentGenerator;
use arx_ai::embeddings::ollama_embed::OllamaEmbedder;
use arx_ai::index::{SimilarityIndex, SnapshotStore};
use arx_ai::judge::LlmJudge;
use arx_ai::llm::ollama_llm::OllamaLlm;
use arx_ai::ollama::OllamaClient;
use arx_ai::pipeline::{ArgumentPipeline, PipelineParts, PipelineSettings};
use arx_ai::providers::forum::ForumCredentials;
use arx_ai::providers::{
    BlogProvider, EvidenceAggregator, EvidenceProvider, ForumProvider, NewsProvider,
};
use arx_core::domain::{Argument, EvaluationMetrics, Stance};
use arx_core::error::{codes, AppError};
use arx_core::report::{
    default_report_path, render_transparency_markdown, save_report_json, write_text_atomic,
    ArgumentSummary, RunReport,
};
use arx_core::scoring::ArgumentScorer;
use tracing::info;

use crate::cli::{GenerateArgs, ScoreArgs};
use crate::config::{env_secret, Config};

const TOP_SOURCES_SHOWN: usize = 3;
const DEFAULT_TRANSPARENCY_FILE: &str = "transparency_report.md";

fn build_providers(config: &Config) -> Vec<Box<dyn EvidenceProvider>> {
    let p = &config.providers;
    let mut providers: Vec<Box<dyn EvidenceProvider>> = Vec::new();
    if p.news.enabled {
        providers.push(Box::new(NewsProvider::new(
            env_secret(&p.news.api_key_env),
            p.news.language.clone(),
        )));
    }
    if p.forum.enabled {
        let credentials = match (
            env_secret(&p.forum.client_id_env),
            env_secret(&p.forum.client_secret_env),
        ) {
            (Some(client_id), Some(client_secret)) => Some(ForumCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        providers.push(Box::new(ForumProvider::new(
            credentials,
            p.forum.user_agent.clone(),
            p.forum.subreddits.clone(),
        )));
    }
    if p.blog.enabled {
        providers.push(Box::new(BlogProvider::new(p.blog.feeds.clone())));
    }
    providers
}

fn build_scorer(config: &Config, client: &OllamaClient) -> ArgumentScorer {
    if !config.scoring.external_judge {
        return ArgumentScorer::rule_based();
    }
    let llm = OllamaLlm::new(client.clone())
        .with_temperature(config.scoring.judge_temperature)
        .with_max_tokens(config.scoring.judge_max_tokens);
    ArgumentScorer::with_external(Box::new(LlmJudge::new(
        Box::new(llm),
        config.ollama.llm_model.clone(),
    )))
}

pub fn build_pipeline(config: &Config, reuse_index: bool) -> Result<ArgumentPipeline, AppError> {
    let client = OllamaClient::new(&config.ollama.base_url)?;
    let gen = &config.generation;

    let index = SimilarityIndex::new(
        Box::new(OllamaEmbedder::new(client.clone())),
        config.ollama.embedding_model.clone(),
    );
    let llm = OllamaLlm::new(client.clone())
        .with_temperature(gen.temperature)
        .with_max_tokens(u32::try_from(gen.argument_max_words).unwrap_or(u32::MAX));
    let generator = ArgumentGenerator::new(Box::new(llm), config.ollama.llm_model.clone())
        .with_limits(gen.max_sources_per_argument, gen.argument_max_words);

    let parts = PipelineParts {
        aggregator: EvidenceAggregator::new(build_providers(config)),
        index,
        generator,
        scorer: build_scorer(config, &client),
        store: Some(SnapshotStore::open(config.retrieval.index_dir.clone())),
    };
    let settings = PipelineSettings {
        top_k: config.retrieval.top_k,
        per_provider_limit: config.retrieval.per_provider_limit,
        reuse_cached_index: reuse_index || config.retrieval.reuse_cached_index,
    };
    Ok(ArgumentPipeline::new(parts, settings))
}

/// `{stem}_transparency.md` beside the JSON report, or `transparency_report.md` without one.
pub fn transparency_path(json_path: Option<&Path>) -> PathBuf {
    match json_path {
        Some(p) => {
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".to_string());
            p.with_file_name(format!("{stem}_transparency.md"))
        }
        None => PathBuf::from(DEFAULT_TRANSPARENCY_FILE),
    }
}

fn push_argument(out: &mut String, heading: &str, arg: &ArgumentSummary) {
    let ev = &arg.evaluation;
    out.push_str(&format!(
        "{heading} (score {}, confidence {})\n",
        ev.overall_score, arg.confidence_score
    ));
    out.push_str(&arg.content);
    out.push_str("\n\n");
    out.push_str(&format!(
        "Clarity {} | Logic {} | Evidence {} | Persuasiveness {}\n",
        ev.clarity, ev.logic, ev.evidence, ev.persuasiveness
    ));
    out.push_str(&format!("Feedback: {}\n", ev.feedback));
    if !arg.citations.is_empty() {
        out.push_str("Citations:\n");
        for c in &arg.citations {
            out.push_str(&format!("  {c}\n"));
        }
    }
    out.push('\n');
}

pub fn render_report_text(report: &RunReport) -> String {
    let mut out = format!("Topic: {}\n\n", report.topic);
    push_argument(&mut out, "PRO ARGUMENT", &report.arguments.pro);
    push_argument(&mut out, "CON ARGUMENT", &report.arguments.con);

    out.push_str(&format!(
        "Top sources ({} used of {} retrieved):\n",
        report.metadata.sources_used, report.metadata.total_sources_retrieved
    ));
    for s in report.sources.iter().take(TOP_SOURCES_SHOWN) {
        out.push_str(&format!(
            "  {}. [{}] {} (relevance {})\n     {}\n",
            s.id, s.kind, s.title, s.relevance_score, s.url
        ));
    }
    out
}

pub fn render_metrics_text(metrics: &EvaluationMetrics) -> String {
    format!(
        "Overall: {:.2}\nClarity: {:.2}\nLogic: {:.2}\nEvidence: {:.2}\nPersuasiveness: {:.2}\nFeedback: {}\n",
        metrics.overall(),
        metrics.clarity(),
        metrics.logic(),
        metrics.evidence_use(),
        metrics.persuasiveness(),
        metrics.feedback()
    )
}

pub fn execute_generate(
    args: &GenerateArgs,
    config: &Config,
    generated_at: &str,
) -> Result<String, AppError> {
    let pipeline = build_pipeline(config, args.reuse_index)?;
    let report = pipeline.run(&args.topic, generated_at)?;

    let json_path = match (&args.save, &args.results_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(default_report_path(dir, &report.topic, generated_at)?),
        (None, None) => None,
    };
    if let Some(path) = json_path.as_deref() {
        save_report_json(&report, path)?;
        info!(path = %path.display(), "report saved");
    }
    if args.transparency {
        let path = transparency_path(json_path.as_deref());
        write_text_atomic(&path, &render_transparency_markdown(&report))?;
        info!(path = %path.display(), "transparency report saved");
    }

    if args.json {
        serde_json::to_string_pretty(&report).map_err(|e| {
            AppError::new("ARX_REPORT_WRITE_FAILED", "Failed to encode report")
                .with_details(e.to_string())
        })
    } else {
        Ok(render_report_text(&report))
    }
}

pub fn score_text(
    content: &str,
    citations: &[String],
    scorer: &ArgumentScorer,
) -> EvaluationMetrics {
    let argument = Argument {
        stance: Stance::Pro,
        content: content.trim().to_string(),
        sources: Vec::new(),
        citations: citations.to_vec(),
        confidence_score: 0.0,
    };
    scorer.evaluate(&argument)
}

pub fn execute_score(args: &ScoreArgs, config: &Config) -> Result<String, AppError> {
    let content = fs::read_to_string(&args.file).map_err(|e| {
        AppError::new(codes::INVALID_INPUT, "Failed to read argument file")
            .with_details(format!("path={}; err={}", args.file.display(), e))
    })?;
    if content.trim().is_empty() {
        return Err(AppError::new(codes::INVALID_INPUT, "Argument file is empty")
            .with_details(format!("path={}", args.file.display())));
    }

    let scorer = if args.rule_only || !config.scoring.external_judge {
        ArgumentScorer::rule_based()
    } else {
        let client = OllamaClient::new(&config.ollama.base_url)?;
        build_scorer(config, &client)
    };
    let metrics = score_text(&content, &args.citations, &scorer);
    Ok(render_metrics_text(&metrics))
}

pub fn execute_health(config: &Config) -> Result<String, AppError> {
    let client = OllamaClient::new(&config.ollama.base_url)?;
    client.health_check()?;
    Ok(format!("Ollama is reachable at {}\n", client.base_url()))
}

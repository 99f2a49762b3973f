use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::{Argument, EvaluationMetrics, EvidenceRecord};
use crate::error::AppError;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSummary {
    pub overall_score: f64,
    pub clarity: f64,
    pub logic: f64,
    pub evidence: f64,
    pub persuasiveness: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArgumentSummary {
    pub content: String,
    pub citations: Vec<String>,
    pub confidence_score: f64,
    pub evaluation: EvaluationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StanceArguments {
    pub pro: ArgumentSummary,
    pub con: ArgumentSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSummary {
    pub id: usize,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub relevance_score: f64,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    pub total_sources_retrieved: usize,
    pub sources_used: usize,
    pub generated_at: String,
    pub model_used: String,
    pub index_reused: bool,
}

/// Complete, displayable result of one topic run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub topic: String,
    pub arguments: StanceArguments,
    pub sources: Vec<SourceSummary>,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub topic: &'a str,
    pub pro: (&'a Argument, &'a EvaluationMetrics),
    pub con: (&'a Argument, &'a EvaluationMetrics),
    pub sources_used: &'a [EvidenceRecord],
    pub total_sources_retrieved: usize,
    pub generated_at: &'a str,
    pub model_used: &'a str,
    pub index_reused: bool,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// First `max_chars` characters of `text`, with `...` appended when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn summarize_argument(argument: &Argument, metrics: &EvaluationMetrics) -> ArgumentSummary {
    ArgumentSummary {
        content: argument.content.clone(),
        citations: argument.citations.clone(),
        confidence_score: argument.confidence_score,
        evaluation: EvaluationSummary {
            overall_score: round_to(metrics.overall(), 2),
            clarity: round_to(metrics.clarity(), 2),
            logic: round_to(metrics.logic(), 2),
            evidence: round_to(metrics.evidence_use(), 2),
            persuasiveness: round_to(metrics.persuasiveness(), 2),
            feedback: metrics.feedback().to_string(),
        },
    }
}

pub fn assemble_report(input: ReportInput<'_>) -> RunReport {
    let sources = input
        .sources_used
        .iter()
        .enumerate()
        .map(|(i, rec)| SourceSummary {
            id: i + 1,
            title: rec.title.clone(),
            url: rec.url.clone(),
            kind: rec.kind.as_str().to_string(),
            relevance_score: round_to(f64::from(rec.relevance_score()), 3),
            preview: preview(&rec.content, PREVIEW_CHARS),
        })
        .collect();

    RunReport {
        topic: input.topic.to_string(),
        arguments: StanceArguments {
            pro: summarize_argument(input.pro.0, input.pro.1),
            con: summarize_argument(input.con.0, input.con.1),
        },
        sources,
        metadata: RunMetadata {
            total_sources_retrieved: input.total_sources_retrieved,
            sources_used: input.sources_used.len(),
            generated_at: input.generated_at.to_string(),
            model_used: input.model_used.to_string(),
            index_reused: input.index_reused,
        },
    }
}

fn push_scores(out: &mut String, heading: &str, arg: &ArgumentSummary) {
    let ev = &arg.evaluation;
    out.push_str(&format!("### {heading} (Score: {})\n", ev.overall_score));
    out.push_str(&format!("- Clarity: {}\n", ev.clarity));
    out.push_str(&format!("- Logic: {}\n", ev.logic));
    out.push_str(&format!("- Evidence: {}\n", ev.evidence));
    out.push_str(&format!("- Persuasiveness: {}\n", ev.persuasiveness));
    out.push_str(&format!("- Feedback: {}\n", ev.feedback));
}

/// Source transparency report in Markdown. Output depends only on the report contents.
pub fn render_transparency_markdown(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("# Source Transparency Report\n\n");
    out.push_str(&format!("**Topic:** {}\n", report.topic));
    out.push_str(&format!("**Generated:** {}\n", report.metadata.generated_at));
    out.push_str(&format!("**Model:** {}\n\n", report.metadata.model_used));

    out.push_str("## Source Overview\n");
    out.push_str(&format!(
        "- Total sources retrieved: {}\n",
        report.metadata.total_sources_retrieved
    ));
    out.push_str(&format!(
        "- Sources used in arguments: {}\n\n",
        report.metadata.sources_used
    ));

    out.push_str("## Sources Used\n\n");
    for s in &report.sources {
        out.push_str(&format!("### Source {}: {}\n", s.id, s.title));
        out.push_str(&format!("- **Type:** {}\n", s.kind));
        out.push_str(&format!("- **URL:** {}\n", s.url));
        out.push_str(&format!("- **Relevance Score:** {}\n", s.relevance_score));
        out.push_str(&format!("- **Preview:** {}\n\n", s.preview));
    }

    out.push_str("## Argument Quality Scores\n\n");
    push_scores(&mut out, "Pro Argument", &report.arguments.pro);
    out.push('\n');
    push_scores(&mut out, "Con Argument", &report.arguments.con);
    out
}

/// `dir/{topic}_{YYYYMMDD_HHMMSS}.json`, with spaces and slashes in the topic replaced by `_`.
pub fn default_report_path(
    dir: &Path,
    topic: &str,
    generated_at: &str,
) -> Result<PathBuf, AppError> {
    let ts = OffsetDateTime::parse(generated_at, &Rfc3339).map_err(|e| {
        AppError::new("ARX_REPORT_TIME_INVALID", "Report timestamp is not RFC3339")
            .with_details(format!("generated_at={generated_at}; err={e}"))
    })?;
    let fmt = time::format_description::parse("[year][month][day]_[hour][minute][second]")
        .map_err(|e| {
            AppError::new("ARX_REPORT_TIME_INVALID", "Invalid report filename format")
                .with_details(e.to_string())
        })?;
    let stamp = ts.format(&fmt).map_err(|e| {
        AppError::new("ARX_REPORT_TIME_INVALID", "Failed to format report timestamp")
            .with_details(e.to_string())
    })?;
    let topic_clean = topic.replace([' ', '/'], "_");
    Ok(dir.join(format!("{topic_clean}_{stamp}.json")))
}

pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new("ARX_REPORT_WRITE_FAILED", "Failed to create report directory")
                .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text.as_bytes()).map_err(|e| {
        AppError::new("ARX_REPORT_WRITE_FAILED", "Failed to write report")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("ARX_REPORT_WRITE_FAILED", "Failed to finalize report write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

pub fn save_report_json(report: &RunReport, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(report).map_err(|e| {
        AppError::new("ARX_REPORT_WRITE_FAILED", "Failed to encode report")
            .with_details(e.to_string())
    })?;
    write_text_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn report_path_uses_clean_topic_and_compact_stamp() {
        let p = default_report_path(
            Path::new("results"),
            "DeFi regulation/necessity",
            "2026-02-10T01:02:03Z",
        )
        .expect("path");
        assert_eq!(
            p,
            Path::new("results").join("DeFi_regulation_necessity_20260210_010203.json")
        );
    }

    #[test]
    fn report_path_rejects_bad_timestamp() {
        let err = default_report_path(Path::new("."), "t", "yesterday").expect_err("should fail");
        assert_eq!(err.code, "ARX_REPORT_TIME_INVALID");
    }
}

use std::sync::{Arc, Mutex};

use arx_ai::draft::ArgumentGenerator;
use arx_ai::llm::Llm;
use arx_core::domain::{EvidenceRecord, SourceKind, Stance};
use arx_core::error::AppError;

struct MockLlm {
    out: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Llm for MockLlm {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.out.clone())
    }
}

struct FailingLlm;

impl Llm for FailingLlm {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::new("ARX_GENERATION_FAILED", "model offline").with_retryable(true))
    }
}

fn sources(n: usize) -> Vec<EvidenceRecord> {
    (1..=n)
        .map(|i| {
            EvidenceRecord::new(
                format!("https://src.example/{i}"),
                format!("Headline{i} about ETFs"),
                format!("Body of source {i}."),
                SourceKind::News,
                "2025-01-01",
            )
        })
        .collect()
}

#[test]
fn drafts_both_stances_from_leading_sources() {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let generator = ArgumentGenerator::new(
        Box::new(MockLlm {
            out: "\n  According to Source 1, flows are rising. Headline3 agrees.  \n".to_string(),
            prompts: prompts.clone(),
        }),
        "llama3.1",
    )
    .with_limits(3, 250);

    let (pro, con) = generator.generate_pro_con("Bitcoin ETFs", &sources(6));

    assert_eq!(pro.stance, Stance::Pro);
    assert_eq!(con.stance, Stance::Con);
    assert_eq!(pro.content, "According to Source 1, flows are rising. Headline3 agrees.");
    assert_eq!(pro.confidence_score, 0.8);
    assert_eq!(pro.sources.len(), 3);
    assert_eq!(
        pro.citations,
        vec![
            "[1] Headline1 about ETFs - https://src.example/1".to_string(),
            "[3] Headline3 about ETFs - https://src.example/3".to_string(),
        ]
    );

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("supporting and advocating for the topic: \"Bitcoin ETFs\""));
    assert!(prompts[1].contains("opposing and arguing against the topic: \"Bitcoin ETFs\""));
    assert!(prompts[0].contains("Keep the argument under 250 words"));
    assert!(prompts[0].contains("Source 3: Headline3 about ETFs"));
    assert!(!prompts[0].contains("Source 4:"));
}

#[test]
fn model_failure_yields_zero_confidence_placeholders() {
    let generator = ArgumentGenerator::new(Box::new(FailingLlm), "llama3.1");
    let (pro, con) = generator.generate_pro_con("Bitcoin ETFs", &sources(2));

    assert_eq!(pro.content, "Unable to generate pro argument due to API error.");
    assert_eq!(con.content, "Unable to generate con argument due to API error.");
    for arg in [&pro, &con] {
        assert_eq!(arg.confidence_score, 0.0);
        assert!(arg.citations.is_empty());
        assert_eq!(arg.sources.len(), 2);
    }
}

#[test]
fn no_sources_still_drafts() {
    let generator = ArgumentGenerator::new(
        Box::new(MockLlm {
            out: "An argument without sources.".to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }),
        "llama3.1",
    );
    let argument = generator.generate("Stablecoins", &[], Stance::Con);
    assert_eq!(argument.content, "An argument without sources.");
    assert!(argument.citations.is_empty());
    assert!(argument.sources.is_empty());
}

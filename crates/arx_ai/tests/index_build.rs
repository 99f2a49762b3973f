use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use arx_ai::embeddings::Embedder;
use arx_ai::index::SimilarityIndex;
use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use proptest::prelude::*;

struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Deterministic embedding: [len, first_byte, last_byte]
        let bytes = input.as_bytes();
        let first = bytes.first().copied().unwrap_or(0) as f32;
        let last = bytes.last().copied().unwrap_or(0) as f32;
        Ok(vec![bytes.len() as f32, first, last])
    }
}

struct Shared(Arc<CountingEmbedder>);

impl Embedder for Shared {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.0.embed(model, input)
    }
}

/// Embeds "zero" to the zero vector and "wide" to four dims; everything else to two.
struct AwkwardEmbedder;

impl Embedder for AwkwardEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        if input.ends_with("zero") {
            Ok(vec![0.0, 0.0])
        } else if input.ends_with("wide") {
            Ok(vec![1.0, 1.0, 1.0, 1.0])
        } else if input.ends_with("down") {
            Err(AppError::new("ARX_EMBEDDINGS_FAILED", "model offline").with_retryable(true))
        } else {
            Ok(vec![1.0, input.len() as f32])
        }
    }
}

/// Parks inside `embed` on any input mentioning "gated" until the test releases it.
struct GatedEmbedder {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl Embedder for GatedEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        if input.contains("gated") {
            let _ = self.entered.lock().expect("entered").send(());
            let _ = self.release.lock().expect("release").recv();
        }
        Ok(vec![1.0, input.len() as f32])
    }
}

fn record(i: usize, content: &str) -> EvidenceRecord {
    EvidenceRecord::new(
        format!("https://evidence.example/{i}"),
        format!("T{i}"),
        content,
        SourceKind::News,
        "2025-01-01",
    )
}

fn norm64(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt()
}

#[test]
fn build_embeds_each_record_once_and_keeps_positions() {
    let embedder = Arc::new(CountingEmbedder::new());
    let index = SimilarityIndex::new(Box::new(Shared(embedder.clone())), "mock");
    let corpus = vec![record(1, "alpha"), record(2, "beta"), record(3, "gamma")];

    index.build(&corpus).expect("build");

    assert_eq!(embedder.call_count(), 3);
    let snap = index.snapshot().expect("ready");
    assert_eq!(snap.len(), 3);
    assert_eq!(snap.vectors().len(), snap.records().len());
    assert_eq!(snap.dims(), 3);
    assert_eq!(snap.records(), corpus.as_slice());
    assert_eq!(snap.model(), "mock");
}

#[test]
fn empty_corpus_is_invalid_input_and_never_embeds() {
    let embedder = Arc::new(CountingEmbedder::new());
    let index = SimilarityIndex::new(Box::new(Shared(embedder.clone())), "mock");
    let err = index.build(&[]).expect_err("empty");
    assert_eq!(err.code, "ARX_INVALID_INPUT");
    assert_eq!(embedder.call_count(), 0);
    assert!(!index.is_ready());
}

#[test]
fn rebuild_replaces_the_previous_index_wholesale() {
    let index = SimilarityIndex::new(Box::new(CountingEmbedder::new()), "mock");
    index
        .build(&[record(1, "one"), record(2, "two"), record(3, "three")])
        .expect("first build");
    index.build(&[record(9, "nine")]).expect("second build");

    let snap = index.snapshot().expect("ready");
    assert_eq!(snap.len(), 1);
    assert_eq!(snap.records()[0].url, "https://evidence.example/9");
}

#[test]
fn failed_builds_leave_the_published_index_untouched() {
    let index = SimilarityIndex::new(Box::new(AwkwardEmbedder), "mock");
    index.build(&[record(1, "fine"), record(2, "also fine")]).expect("build");
    let before = index.snapshot().expect("ready");

    let err = index
        .build(&[record(3, "fine"), record(4, "zero")])
        .expect_err("zero vector");
    assert_eq!(err.code, "ARX_INDEX_BUILD_FAILED");

    let err = index
        .build(&[record(5, "fine"), record(6, "wide")])
        .expect_err("dims mismatch");
    assert_eq!(err.code, "ARX_INDEX_BUILD_FAILED");

    let err = index.build(&[record(7, "down")]).expect_err("embedder down");
    assert_eq!(err.code, "ARX_EMBEDDINGS_FAILED");
    assert!(err.retryable);

    let after = index.snapshot().expect("still ready");
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(index.len(), 2);
}

fn sorted_urls(records: &[EvidenceRecord]) -> Vec<String> {
    let mut urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
    urls.sort();
    urls
}

#[test]
fn search_during_a_build_sees_the_whole_previous_index() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let index = SimilarityIndex::new(
        Box::new(GatedEmbedder {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }),
        "mock",
    );
    index
        .build(&[record(1, "old one"), record(2, "old two"), record(3, "old three")])
        .expect("first build");
    let next = vec![record(7, "new gated"), record(8, "new eight")];

    let (during, rebuilt) = thread::scope(|s| {
        let builder = s.spawn(|| index.build(&next));
        entered_rx.recv().expect("build reached the embedder");
        let during = index.search("old", 10);
        release_tx.send(()).expect("release build");
        (during, builder.join().expect("builder thread"))
    });

    let during = during.expect("search while building");
    assert_eq!(
        sorted_urls(&during),
        vec![
            "https://evidence.example/1".to_string(),
            "https://evidence.example/2".to_string(),
            "https://evidence.example/3".to_string(),
        ]
    );
    rebuilt.expect("second build");

    let after = index.search("old", 10).expect("search after build");
    assert_eq!(
        sorted_urls(&after),
        vec![
            "https://evidence.example/7".to_string(),
            "https://evidence.example/8".to_string(),
        ]
    );
}

#[test]
fn clear_drops_the_index() {
    let index = SimilarityIndex::new(Box::new(CountingEmbedder::new()), "mock");
    index.build(&[record(1, "x")]).expect("build");
    index.clear();
    assert!(!index.is_ready());
    assert!(index.is_empty());
}

proptest! {
    #[test]
    fn every_stored_vector_is_unit_length(
        contents in prop::collection::vec("[a-z ]{0,40}", 1..12),
    ) {
        let corpus: Vec<EvidenceRecord> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| record(i, c))
            .collect();
        let index = SimilarityIndex::new(Box::new(CountingEmbedder::new()), "mock");
        index.build(&corpus).expect("build");

        let snap = index.snapshot().expect("ready");
        prop_assert_eq!(snap.vectors().len(), corpus.len());
        prop_assert_eq!(snap.records().len(), corpus.len());
        for v in snap.vectors() {
            prop_assert!((norm64(v) - 1.0).abs() <= 1e-6);
        }
    }
}

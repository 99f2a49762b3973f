use std::fs;

use arx_ai::embeddings::Embedder;
use arx_ai::index::{LoadOutcome, SimilarityIndex, SnapshotStore};
use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use pretty_assertions::assert_eq;

struct CountABEmbedder;

impl Embedder for CountABEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let a = input.chars().filter(|c| *c == 'a').count();
        let b = input.chars().filter(|c| *c == 'b').count();
        Ok(vec![a as f32, b as f32])
    }
}

fn corpus() -> Vec<EvidenceRecord> {
    vec![
        EvidenceRecord::new("https://n.example/1", "T1", "aaab", SourceKind::News, "2025-02-01"),
        EvidenceRecord::new("https://f.example/2", "T2", "bb", SourceKind::Forum, "1700000000"),
        EvidenceRecord::new("https://b.example/3", "T3", "ab", SourceKind::Blog, ""),
    ]
}

fn built(model: &str) -> SimilarityIndex {
    let index = SimilarityIndex::new(Box::new(CountABEmbedder), model);
    index.build(&corpus()).expect("build");
    index
}

#[test]
fn save_then_load_restores_an_identical_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());
    let original = built("mock");

    let manifest = original.save(&store).expect("save");
    assert_eq!(manifest.count, 3);
    assert_eq!(manifest.dims, 2);
    assert_eq!(manifest.model, "mock");
    assert!(store.manifest_path().exists());

    let restored = SimilarityIndex::new(Box::new(CountABEmbedder), "mock");
    assert_eq!(restored.load(&store), LoadOutcome::Loaded { count: 3, dims: 2 });
    assert_eq!(
        restored.search("ab", 3).expect("search"),
        original.search("ab", 3).expect("search")
    );
    assert_eq!(
        restored.snapshot().expect("ready").records(),
        corpus().as_slice()
    );
}

#[test]
fn missing_snapshot_is_unavailable_and_empties_the_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().join("nothing-here"));
    let index = built("mock");

    let outcome = index.load(&store);
    assert!(matches!(outcome, LoadOutcome::Unavailable { .. }));
    assert!(!index.is_ready());
    assert!(index.search("a", 3).expect("search").is_empty());
}

#[test]
fn tampered_payload_is_rejected_as_a_unit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());
    built("mock").save(&store).expect("save");

    let records = fs::read_to_string(store.records_path()).expect("read records");
    fs::write(store.records_path(), records.replace("T2", "T9")).expect("tamper");

    let index = SimilarityIndex::new(Box::new(CountABEmbedder), "mock");
    match index.load(&store) {
        LoadOutcome::Unavailable { reason } => assert!(reason.contains("checksum")),
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert!(!index.is_ready());
}

#[test]
fn truncated_manifest_is_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());
    built("mock").save(&store).expect("save");
    fs::write(store.manifest_path(), "{\"format_version\":").expect("truncate");

    let index = SimilarityIndex::new(Box::new(CountABEmbedder), "mock");
    assert!(matches!(index.load(&store), LoadOutcome::Unavailable { .. }));
}

#[test]
fn snapshot_from_another_model_is_not_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());
    built("model-a").save(&store).expect("save");

    let index = SimilarityIndex::new(Box::new(CountABEmbedder), "model-b");
    assert!(matches!(index.load(&store), LoadOutcome::Unavailable { .. }));
    assert!(!index.is_ready());
}

#[test]
fn saving_an_unbuilt_index_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().to_path_buf());
    let index = SimilarityIndex::new(Box::new(CountABEmbedder), "mock");
    let err = index.save(&store).expect_err("nothing to save");
    assert_eq!(err.code, "ARX_INDEX_UNAVAILABLE");
    assert!(!store.manifest_path().exists());
}

use std::fs;
use std::path::{Path, PathBuf};

use arx_core::domain::EvidenceRecord;
use arx_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::similarity::l2_norm;

const FORMAT_VERSION: u32 = 1;
const UNIT_NORM_TOLERANCE: f32 = 1e-4;

/// Unit-length vectors paired positionally with the records that produced them.
///
/// Construction checks `vectors.len() == records.len()`, a single dimension and unit norms, so a
/// snapshot that exists is always searchable.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    model: String,
    dims: usize,
    vectors: Vec<Vec<f32>>,
    records: Vec<EvidenceRecord>,
}

impl IndexSnapshot {
    pub(crate) fn from_parts(
        model: String,
        vectors: Vec<Vec<f32>>,
        records: Vec<EvidenceRecord>,
    ) -> Result<Self, AppError> {
        if vectors.len() != records.len() {
            return Err(AppError::new(
                "ARX_INDEX_BUILD_FAILED",
                "Vector and record counts differ",
            )
            .with_details(format!("vectors={}; records={}", vectors.len(), records.len())));
        }
        let dims = vectors.first().map(Vec::len).ok_or_else(|| {
            AppError::new(codes::INVALID_INPUT, "Index snapshot must not be empty")
        })?;
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dims {
                return Err(AppError::new(
                    "ARX_INDEX_BUILD_FAILED",
                    "Embedding dimension mismatch across records",
                )
                .with_details(format!("expected={dims}; got={}; position={i}", v.len())));
            }
            if (l2_norm(v) - 1.0).abs() > UNIT_NORM_TOLERANCE {
                return Err(AppError::new(
                    "ARX_INDEX_BUILD_FAILED",
                    "Index vector is not unit length",
                )
                .with_details(format!("position={i}")));
            }
        }
        Ok(Self {
            model,
            dims,
            vectors,
            records,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotManifest {
    pub format_version: u32,
    pub model: String,
    pub dims: usize,
    pub count: usize,
    pub vectors_sha256: String,
    pub records_sha256: String,
}

/// On-disk home of one index snapshot: vectors, records and a manifest tying them together.
///
/// The manifest is written last and carries sha256 digests of both payload files, so a reader
/// either sees a matching pair or rejects the snapshot as a whole.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn unavailable(message: &str) -> AppError {
    AppError::new(codes::INDEX_UNAVAILABLE, message)
}

impl SnapshotStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    pub fn vectors_path(&self) -> PathBuf {
        self.root.join("vectors.json")
    }

    pub fn records_path(&self) -> PathBuf {
        self.root.join("records.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::new("ARX_INDEX_PERSIST_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| {
            AppError::new("ARX_INDEX_PERSIST_FAILED", "Failed to write index file")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::new("ARX_INDEX_PERSIST_FAILED", "Failed to finalize index file write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })
    }

    fn encode<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec(value).map_err(|e| {
            AppError::new("ARX_INDEX_PERSIST_FAILED", format!("Failed to encode index {what}"))
                .with_details(e.to_string())
        })
    }

    pub fn write(&self, snapshot: &IndexSnapshot) -> Result<SnapshotManifest, AppError> {
        self.ensure_dirs()?;

        let vectors = Self::encode(snapshot.vectors(), "vectors")?;
        let records = Self::encode(snapshot.records(), "records")?;
        let manifest = SnapshotManifest {
            format_version: FORMAT_VERSION,
            model: snapshot.model().to_string(),
            dims: snapshot.dims(),
            count: snapshot.len(),
            vectors_sha256: sha256_hex(&vectors),
            records_sha256: sha256_hex(&records),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            AppError::new("ARX_INDEX_PERSIST_FAILED", "Failed to encode index manifest")
                .with_details(e.to_string())
        })?;

        // Payloads first, manifest last: a crash in between leaves digests that no longer match.
        self.write_atomic(&self.vectors_path(), &vectors)?;
        self.write_atomic(&self.records_path(), &records)?;
        self.write_atomic(&self.manifest_path(), &manifest_json)?;
        Ok(manifest)
    }

    fn read_verified(&self, path: &Path, expected_sha256: &str) -> Result<Vec<u8>, AppError> {
        let bytes = fs::read(path).map_err(|e| {
            unavailable("Failed to read index file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let actual = sha256_hex(&bytes);
        if actual != expected_sha256 {
            return Err(unavailable("Index file checksum mismatch").with_details(format!(
                "path={}; expected={expected_sha256}; actual={actual}",
                path.display()
            )));
        }
        Ok(bytes)
    }

    pub fn read_manifest(&self) -> Result<SnapshotManifest, AppError> {
        let path = self.manifest_path();
        let bytes = fs::read(&path).map_err(|e| {
            unavailable("No index snapshot found")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            unavailable("Failed to decode index manifest")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Read and fully validate a snapshot. Every failure is `ARX_INDEX_UNAVAILABLE`.
    pub fn read(&self, expected_model: &str) -> Result<IndexSnapshot, AppError> {
        let manifest = self.read_manifest()?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(unavailable("Unsupported index snapshot version")
                .with_details(format!("version={}", manifest.format_version)));
        }
        if manifest.model != expected_model {
            return Err(unavailable("Index snapshot was built with a different model")
                .with_details(format!(
                    "snapshot_model={}; expected={expected_model}",
                    manifest.model
                )));
        }

        let vector_bytes = self.read_verified(&self.vectors_path(), &manifest.vectors_sha256)?;
        let record_bytes = self.read_verified(&self.records_path(), &manifest.records_sha256)?;
        let vectors: Vec<Vec<f32>> = serde_json::from_slice(&vector_bytes).map_err(|e| {
            unavailable("Failed to decode index vectors").with_details(e.to_string())
        })?;
        let records: Vec<EvidenceRecord> = serde_json::from_slice(&record_bytes).map_err(|e| {
            unavailable("Failed to decode index records").with_details(e.to_string())
        })?;

        if vectors.len() != manifest.count || records.len() != manifest.count {
            return Err(unavailable("Index snapshot counts do not match manifest").with_details(
                format!(
                    "manifest={}; vectors={}; records={}",
                    manifest.count,
                    vectors.len(),
                    records.len()
                ),
            ));
        }

        let snapshot =
            IndexSnapshot::from_parts(manifest.model, vectors, records).map_err(|e| {
                unavailable("Index snapshot is inconsistent").with_details(e.to_string())
            })?;
        if snapshot.dims() != manifest.dims {
            return Err(unavailable("Index snapshot dims do not match manifest")
                .with_details(format!("manifest={}; vectors={}", manifest.dims, snapshot.dims())));
        }
        Ok(snapshot)
    }
}

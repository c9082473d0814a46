//! Corpus - 청크 목록과 벡터 인덱스를 함께 소유
//!
//! 청크 위치 i는 임베딩 행 i와 같아야 합니다. `Corpus`는 두 컬렉션을
//! 생성 시점에 검증하고, 이후에는 읽기 전용으로만 노출합니다.
//!
//! 아티팩트 디렉토리 구성:
//! - `passages.json`   청크 목록 (serde_json)
//! - `embeddings.bin`  임베딩 행렬 (bincode)
//! - `index.bin`       벡터 인덱스 (bincode)
//! - `manifest.json`   생성 정보

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RagError;

use super::index::FlatL2Index;
use super::vector::{EmbeddingMatrix, Passage};

const PASSAGES_FILE: &str = "passages.json";
const EMBEDDINGS_FILE: &str = "embeddings.bin";
const INDEX_FILE: &str = "index.bin";
const MANIFEST_FILE: &str = "manifest.json";

// ============================================================================
// Corpus
// ============================================================================

/// 정렬이 보장된 청크 + 인덱스
#[derive(Debug, Clone)]
pub struct Corpus {
    passages: Vec<Passage>,
    index: FlatL2Index,
}

impl Corpus {
    /// 청크와 인덱스로 생성 (행 수 = 청크 수 검증)
    pub fn new(passages: Vec<Passage>, index: FlatL2Index) -> Result<Self, RagError> {
        if passages.len() != index.len() {
            return Err(RagError::Consistency {
                passages: passages.len(),
                rows: index.len(),
            });
        }
        Ok(Self { passages, index })
    }

    /// 청크와 임베딩 행렬로 생성 (인덱스 빌드 포함)
    pub fn from_embeddings(passages: Vec<Passage>, matrix: EmbeddingMatrix) -> Result<Self, RagError> {
        Self::new(passages, FlatL2Index::build(matrix))
    }

    /// 빈 코퍼스
    pub fn empty(dimension: usize) -> Self {
        Self {
            passages: Vec::new(),
            index: FlatL2Index::build(EmbeddingMatrix::empty(dimension)),
        }
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn passage(&self, position: usize) -> Option<&Passage> {
        self.passages.get(position)
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// 벡터 검색 후 청크로 역참조 (거리 오름차순)
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, &Passage, f32)>, RagError> {
        let neighbors = self.index.search(query, k)?;
        Ok(neighbors
            .into_iter()
            .filter_map(|n| self.passage(n.row).map(|p| (n.row, p, n.distance)))
            .collect())
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// 인제스트 실행 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub source_id: String,
    /// 원문 SHA-256 (hex)
    pub source_sha256: String,
    pub embed_model: String,
    pub dimension: usize,
    pub passage_count: usize,
    pub oversized_count: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    /// 코퍼스와 원문으로 생성
    pub fn describe(
        corpus: &Corpus,
        source_id: &str,
        source_text: &str,
        embed_model: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_sha256: sha256_hex(source_text),
            embed_model: embed_model.to_string(),
            dimension: corpus.dimension(),
            passage_count: corpus.len(),
            oversized_count: corpus.passages().iter().filter(|p| p.oversized).count(),
            chunk_size,
            overlap,
            created_at: Utc::now(),
        }
    }
}

/// 텍스트 SHA-256 (hex)
pub fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

// ============================================================================
// ArtifactStore
// ============================================================================

/// 아티팩트 존재 여부
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub dir: PathBuf,
    pub passages: bool,
    pub embeddings: bool,
    pub index: bool,
    pub manifest: bool,
}

/// 아티팩트 디렉토리 읽기/쓰기
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// 디렉토리 지정 (생성은 저장 시점에)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn passages_path(&self) -> PathBuf {
        self.dir.join(PASSAGES_FILE)
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.dir.join(EMBEDDINGS_FILE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// 전체 아티팩트 저장 (all-or-nothing)
    pub fn save(&self, corpus: &Corpus, manifest: &Manifest) -> Result<()> {
        let passages = serde_json::to_vec_pretty(corpus.passages())
            .context("Failed to serialize passages")?;
        let embeddings = encode_matrix(corpus.index().matrix())?;
        let index = corpus.index().to_bytes()?;
        let manifest =
            serde_json::to_vec_pretty(manifest).context("Failed to serialize manifest")?;

        write_all_or_nothing(&[
            (self.passages_path(), passages),
            (self.embeddings_path(), embeddings),
            (self.index_path(), index),
            (self.manifest_path(), manifest),
        ])?;

        tracing::info!(
            "Saved {} passages to {}",
            corpus.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// 청크 + 인덱스 로드 (임베딩 행렬 불필요)
    ///
    /// 청크 수와 인덱스 행 수, 그리고 매니페스트 기록을 모두 대조합니다.
    pub fn load(&self) -> Result<Corpus> {
        let (corpus, _) = self.load_with_manifest()?;
        Ok(corpus)
    }

    /// 질의용 로드 (현재 임베딩 모델/차원이 인덱스 생성 당시와 같아야 함)
    pub fn load_for_model(&self, embed_model: &str, dimension: usize) -> Result<Corpus> {
        let (corpus, manifest) = self.load_with_manifest()?;
        ensure_same("embed_model", &manifest.embed_model, &embed_model.to_string())?;
        ensure_same("dimension", &manifest.dimension, &dimension)?;
        Ok(corpus)
    }

    fn load_with_manifest(&self) -> Result<(Corpus, Manifest)> {
        let passages = self.load_passages()?;
        let index_path = self.index_path();
        let bytes = read_artifact("index", &index_path)?;
        let index = FlatL2Index::from_bytes(&bytes)
            .with_context(|| format!("Failed to load index: {:?}", index_path))?;

        let corpus = Corpus::new(passages, index)?;
        let manifest = self
            .load_manifest()?
            .ok_or_else(|| RagError::missing("manifest", self.manifest_path()))?;
        ensure_same("passage_count", &manifest.passage_count, &corpus.len())?;
        ensure_same("dimension", &manifest.dimension, &corpus.dimension())?;

        tracing::debug!(
            "Loaded corpus: {} passages, dimension {}",
            corpus.len(),
            corpus.dimension()
        );
        Ok((corpus, manifest))
    }

    /// 청크 목록 로드
    pub fn load_passages(&self) -> Result<Vec<Passage>> {
        let path = self.passages_path();
        let bytes = read_artifact("passages", &path)?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse passages: {:?}", path))
    }

    /// 임베딩 행렬 로드
    pub fn load_embeddings(&self) -> Result<EmbeddingMatrix> {
        let path = self.embeddings_path();
        let bytes = read_artifact("embeddings", &path)?;
        let (matrix, _): (EmbeddingMatrix, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .with_context(|| format!("Failed to decode embeddings: {:?}", path))?;
        Ok(matrix)
    }

    /// 매니페스트 로드 (없으면 None)
    pub fn load_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let manifest = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
        Ok(Some(manifest))
    }

    /// 임베딩 행렬에서 인덱스 재생성
    pub fn rebuild_index(&self) -> Result<Corpus> {
        let passages = self.load_passages()?;
        let matrix = self.load_embeddings()?;
        let corpus = Corpus::from_embeddings(passages, matrix)?;

        write_all_or_nothing(&[(self.index_path(), corpus.index().to_bytes()?)])?;
        tracing::info!(
            "Rebuilt index at {} ({} rows)",
            self.index_path().display(),
            corpus.len()
        );
        Ok(corpus)
    }

    /// 아티팩트 존재 여부
    pub fn status(&self) -> ArtifactStatus {
        ArtifactStatus {
            dir: self.dir.clone(),
            passages: self.passages_path().exists(),
            embeddings: self.embeddings_path().exists(),
            index: self.index_path().exists(),
            manifest: self.manifest_path().exists(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn encode_matrix(matrix: &EmbeddingMatrix) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(matrix, bincode::config::standard())
        .context("Failed to encode embeddings")
}

/// 매니페스트 기록값과 현재 값 비교
fn ensure_same<T>(field: &'static str, recorded: &T, current: &T) -> Result<(), RagError>
where
    T: PartialEq + std::fmt::Display,
{
    if recorded != current {
        return Err(RagError::ManifestMismatch {
            field,
            recorded: recorded.to_string(),
            current: current.to_string(),
        });
    }
    Ok(())
}

fn read_artifact(kind: &'static str, path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(RagError::missing(kind, path).into());
    }
    std::fs::read(path).with_context(|| format!("Failed to read {} artifact: {:?}", kind, path))
}

/// 모든 파일을 `.part`로 쓴 뒤 기존 파일을 `.bak`으로 밀어내고 교체
///
/// 어느 단계에서 실패하든 교체한 파일을 되돌리고 `.part` 파일을 지우므로
/// 디렉토리에는 이전 아티팩트 세트가 그대로 남습니다.
fn write_all_or_nothing(files: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    let mut parts: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for (path, bytes) in files {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                discard_parts(&parts);
                return Err(e).with_context(|| format!("Failed to create directory: {:?}", parent));
            }
        }

        let part = part_path(path);
        if let Err(e) = std::fs::write(&part, bytes) {
            let _ = std::fs::remove_file(&part);
            discard_parts(&parts);
            return Err(e).with_context(|| format!("Failed to write {:?}", part));
        }
        parts.push((part, path.as_path()));
    }

    let mut swapped: Vec<Swap> = Vec::with_capacity(parts.len());
    for (i, (part, path)) in parts.iter().enumerate() {
        if let Err(e) = swap_into_place(part, path, &mut swapped) {
            rollback(&swapped);
            discard_parts(&parts[i..]);
            return Err(e);
        }
    }

    for swap in &swapped {
        if let Some(backup) = &swap.backup {
            if let Err(e) = remove_path(backup) {
                tracing::warn!("Failed to remove backup {:?}: {}", backup, e);
            }
        }
    }

    Ok(())
}

/// 교체된 대상과 그 백업 위치
struct Swap {
    target: PathBuf,
    backup: Option<PathBuf>,
    installed: bool,
}

fn swap_into_place(part: &Path, target: &Path, swapped: &mut Vec<Swap>) -> Result<()> {
    let backup = if target.exists() {
        let backup = backup_path(target);
        std::fs::rename(target, &backup)
            .with_context(|| format!("Failed to back up {:?}", target))?;
        Some(backup)
    } else {
        None
    };

    swapped.push(Swap {
        target: target.to_path_buf(),
        backup,
        installed: false,
    });

    std::fs::rename(part, target)
        .with_context(|| format!("Failed to move {:?} into place", part))?;
    if let Some(last) = swapped.last_mut() {
        last.installed = true;
    }
    Ok(())
}

/// 역순으로 새 파일을 지우고 백업을 복원
fn rollback(swapped: &[Swap]) {
    for swap in swapped.iter().rev() {
        if swap.installed {
            if let Err(e) = remove_path(&swap.target) {
                tracing::warn!("Failed to remove {:?} during rollback: {}", swap.target, e);
            }
        }
        if let Some(backup) = &swap.backup {
            if let Err(e) = std::fs::rename(backup, &swap.target) {
                tracing::error!(
                    "Failed to restore {:?} from {:?}: {}",
                    swap.target,
                    backup,
                    e
                );
            }
        }
    }
}

fn discard_parts(parts: &[(PathBuf, &Path)]) {
    for (part, _) in parts {
        let _ = std::fs::remove_file(part);
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn part_path(path: &Path) -> PathBuf {
    with_suffix(path, ".part")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_corpus() -> Corpus {
        let passages = vec![
            Passage::new("codigo_obras", "Art. 241. Os recuos de frente..."),
            Passage::new("codigo_obras", "Art. 5. Disposições gerais..."),
        ];
        let matrix =
            EmbeddingMatrix::from_rows(3, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        Corpus::from_embeddings(passages, matrix).unwrap()
    }

    fn manifest_for(corpus: &Corpus) -> Manifest {
        Manifest::describe(corpus, "codigo_obras", "texto", "test-model", 512, 64)
    }

    #[test]
    fn test_count_mismatch_is_consistency_error() {
        let passages = vec![Passage::new("doc", "a"), Passage::new("doc", "b")];
        let matrix = EmbeddingMatrix::from_rows(2, vec![vec![0.0, 1.0]]).unwrap();

        let err = Corpus::from_embeddings(passages, matrix).unwrap_err();
        assert!(matches!(
            err,
            RagError::Consistency {
                passages: 2,
                rows: 1
            }
        ));
    }

    #[test]
    fn test_search_dereferences_positions() {
        let corpus = sample_corpus();
        let hits = corpus.search(&[0.0, 0.9, 0.0], 2).unwrap();

        assert_eq!(hits[0].0, 1);
        assert!(hits[0].1.text.starts_with("Art. 5."));
        assert_eq!(hits[1].0, 0);
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::empty(3);
        assert!(corpus.is_empty());
        assert!(corpus.search(&[0.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        let corpus = sample_corpus();
        let manifest = manifest_for(&corpus);

        store.save(&corpus, &manifest).unwrap();

        let status = store.status();
        assert!(status.passages && status.embeddings && status.index && status.manifest);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.passages(), corpus.passages());
        assert_eq!(loaded.index(), corpus.index());
        assert_eq!(store.load_manifest().unwrap(), Some(manifest));

        // .part 파일이 남지 않아야 함
        let leftovers = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        std::fs::write(store.passages_path(), "[]").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::MissingArtifact { kind: "index", .. })
        ));
    }

    #[test]
    fn test_load_detects_truncated_passages() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = sample_corpus();
        store.save(&corpus, &manifest_for(&corpus)).unwrap();

        // 부분 재실행으로 청크 목록만 바뀐 상황
        let truncated = serde_json::to_vec(&corpus.passages()[..1]).unwrap();
        std::fs::write(store.passages_path(), truncated).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::Consistency {
                passages: 1,
                rows: 2
            })
        ));
    }

    #[test]
    fn test_rebuild_index_from_embeddings() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = sample_corpus();
        store.save(&corpus, &manifest_for(&corpus)).unwrap();

        std::fs::remove_file(store.index_path()).unwrap();
        assert!(store.load().is_err());

        let rebuilt = store.rebuild_index().unwrap();
        assert_eq!(rebuilt.index(), corpus.index());
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_manifest_fields() {
        let corpus = sample_corpus();
        let manifest = manifest_for(&corpus);
        assert_eq!(manifest.passage_count, 2);
        assert_eq!(manifest.dimension, 3);
        assert_eq!(manifest.source_sha256, sha256_hex("texto"));
        assert_eq!(manifest.source_sha256.len(), 64);
    }

    fn crossed_corpus(first: &str, second: &str, rows: [[f32; 2]; 2]) -> Corpus {
        let passages = vec![
            Passage::new("codigo_obras", first),
            Passage::new("codigo_obras", second),
        ];
        let matrix = EmbeddingMatrix::from_rows(2, rows.iter().map(|r| r.to_vec()).collect())
            .unwrap();
        Corpus::from_embeddings(passages, matrix).unwrap()
    }

    fn files_ending_with(dir: &Path, suffix: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(suffix))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_swap_keeps_previous_set() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let old = crossed_corpus("OLD A", "OLD B", [[1.0, 0.0], [0.0, 1.0]]);
        let old_manifest = manifest_for(&old);
        store.save(&old, &old_manifest).unwrap();

        // index.bin 백업 자리를 비어있지 않은 디렉토리로 막아 세 번째 교체에서 실패
        let blocker = dir.path().join("index.bin.bak");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let new = crossed_corpus("NEW B", "NEW A", [[0.0, 1.0], [1.0, 0.0]]);
        assert!(store.save(&new, &manifest_for(&new)).is_err());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.passages(), old.passages());
        assert_eq!(loaded.index(), old.index());
        assert_eq!(&store.load_embeddings().unwrap(), old.index().matrix());
        assert_eq!(store.load_manifest().unwrap(), Some(old_manifest));

        let nearest = loaded.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(nearest[0].1.text, "OLD A");

        assert!(files_ending_with(dir.path(), ".part").is_empty());
        assert_eq!(files_ending_with(dir.path(), ".bak"), vec!["index.bin.bak"]);
    }

    #[test]
    fn test_save_replaces_non_file_target() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let old = crossed_corpus("OLD A", "OLD B", [[1.0, 0.0], [0.0, 1.0]]);
        store.save(&old, &manifest_for(&old)).unwrap();

        std::fs::remove_file(store.embeddings_path()).unwrap();
        std::fs::create_dir(store.embeddings_path()).unwrap();
        std::fs::write(store.embeddings_path().join("stale"), "x").unwrap();

        let new = crossed_corpus("NEW B", "NEW A", [[0.0, 1.0], [1.0, 0.0]]);
        store.save(&new, &manifest_for(&new)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.passages(), new.passages());
        assert_eq!(loaded.search(&[1.0, 0.0], 1).unwrap()[0].1.text, "NEW A");
        assert!(files_ending_with(dir.path(), ".part").is_empty());
        assert!(files_ending_with(dir.path(), ".bak").is_empty());
    }

    #[test]
    fn test_load_requires_manifest() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = sample_corpus();
        store.save(&corpus, &manifest_for(&corpus)).unwrap();
        std::fs::remove_file(store.manifest_path()).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::MissingArtifact {
                kind: "manifest",
                ..
            })
        ));
    }

    #[test]
    fn test_load_checks_manifest_passage_count() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = sample_corpus();
        let mut manifest = manifest_for(&corpus);
        store.save(&corpus, &manifest).unwrap();

        manifest.passage_count = 5;
        std::fs::write(
            store.manifest_path(),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::ManifestMismatch {
                field: "passage_count",
                ..
            })
        ));
    }

    #[test]
    fn test_load_for_model_checks_embedding_space() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = sample_corpus();
        store.save(&corpus, &manifest_for(&corpus)).unwrap();

        assert_eq!(store.load_for_model("test-model", 3).unwrap().len(), 2);

        let err = store.load_for_model("other-model", 3).unwrap_err();
        match err.downcast_ref::<RagError>() {
            Some(RagError::ManifestMismatch {
                field,
                recorded,
                current,
            }) => {
                assert_eq!(*field, "embed_model");
                assert_eq!(recorded, "test-model");
                assert_eq!(current, "other-model");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = store.load_for_model("test-model", 768).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::ManifestMismatch {
                field: "dimension",
                ..
            })
        ));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/a/index.bin")),
            PathBuf::from("/a/index.bin.part")
        );
    }
}

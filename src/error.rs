//! 에러 분류
//!
//! 대부분의 경로는 `anyhow::Result` + `.context(..)`로 전파합니다.
//! 호출자가 실패 종류를 구분해야 하는 경우에만 `RagError`를 사용하며,
//! `err.downcast_ref::<RagError>()`로 꺼낼 수 있습니다.

use std::path::PathBuf;

use thiserror::Error;

/// RAG 파이프라인 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 필수 아티팩트(원문, 청크, 임베딩, 인덱스) 파일 없음
    #[error("Missing {kind} artifact: {path}")]
    MissingArtifact { kind: &'static str, path: PathBuf },

    /// 청크 수와 임베딩/인덱스 행 수 불일치
    #[error(
        "Consistency error: {passages} passages but {rows} embedding rows \
         (re-run ingestion to regenerate all artifacts)"
    )]
    Consistency { passages: usize, rows: usize },

    /// 매니페스트 기록과 현재 아티팩트/설정 불일치
    #[error(
        "Manifest mismatch on {field}: artifacts were built with {recorded}, got {current} \
         (re-run ingestion to regenerate all artifacts)"
    )]
    ManifestMismatch {
        field: &'static str,
        recorded: String,
        current: String,
    },

    /// 벡터 차원 불일치
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 외부 생성 프로세스 실패
    #[error("Generation failed: {0}")]
    Generation(String),

    /// 외부 생성 프로세스 타임아웃
    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),
}

impl RagError {
    /// 아티팩트 누락 에러 생성
    pub fn missing(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            kind,
            path: path.into(),
        }
    }
}

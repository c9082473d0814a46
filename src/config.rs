//! 설정 모듈
//!
//! 기본값 → 환경변수 → CLI 플래그 순서로 덮어씁니다.
//!
//! | 필드 | 환경변수 |
//! |---|---|
//! | data_dir | `OBRAS_RAG_DATA_DIR` |
//! | ollama_url | `OLLAMA_HOST` |
//! | embed_model | `OBRAS_RAG_EMBED_MODEL` |
//! | embed_dimension | `OBRAS_RAG_EMBED_DIM` |
//! | embed_batch_size | `OBRAS_RAG_EMBED_BATCH` |
//! | generator_command | `OBRAS_RAG_GENERATOR` |
//! | generation_timeout_secs | `OBRAS_RAG_TIMEOUT_SECS` |

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

// ============================================================================
// Defaults
// ============================================================================

/// 기본 Ollama 주소
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// 기본 임베딩 모델 (다국어 sentence-transformers 계열)
pub const DEFAULT_EMBED_MODEL: &str = "paraphrase-multilingual";

/// 기본 임베딩 차원
pub const DEFAULT_EMBED_DIMENSION: usize = 768;

/// 기본 임베딩 배치 크기
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// 기본 답변 생성 명령
pub const DEFAULT_GENERATOR_COMMAND: &str = "ollama run llama3";

/// 기본 생성 타임아웃 (초)
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;

/// 기본 시맨틱 검색 개수
pub const DEFAULT_TOP_K: usize = 3;

/// 데이터 디렉토리 경로 (~/.obras-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".obras-rag")
}

// ============================================================================
// RagConfig
// ============================================================================

/// 파이프라인 전체 설정
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// 아티팩트 저장 디렉토리
    pub data_dir: PathBuf,
    /// Ollama 서버 주소
    pub ollama_url: String,
    /// 임베딩 모델 이름
    pub embed_model: String,
    /// 임베딩 차원 (모델에 따라 고정)
    pub embed_dimension: usize,
    /// 임베딩 요청당 텍스트 수
    pub embed_batch_size: usize,
    /// 답변 생성 명령 (프롬프트는 stdin으로 전달)
    pub generator_command: String,
    /// 답변 생성 타임아웃 (초)
    pub generation_timeout_secs: u64,
    /// 시맨틱 검색 개수
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: get_data_dir(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dimension: DEFAULT_EMBED_DIMENSION,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            generator_command: DEFAULT_GENERATOR_COMMAND.to_string(),
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RagConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드 (빈 값은 미설정으로 취급)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("OBRAS_RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("OLLAMA_HOST") {
            config.ollama_url = normalize_url(&url);
        }
        if let Some(model) = get("OBRAS_RAG_EMBED_MODEL") {
            config.embed_model = model;
        }
        if let Some(dim) = get("OBRAS_RAG_EMBED_DIM") {
            config.embed_dimension = parse_var("OBRAS_RAG_EMBED_DIM", &dim)?;
        }
        if let Some(batch) = get("OBRAS_RAG_EMBED_BATCH") {
            config.embed_batch_size = parse_var("OBRAS_RAG_EMBED_BATCH", &batch)?;
        }
        if let Some(cmd) = get("OBRAS_RAG_GENERATOR") {
            config.generator_command = cmd;
        }
        if let Some(secs) = get("OBRAS_RAG_TIMEOUT_SECS") {
            config.generation_timeout_secs = parse_var("OBRAS_RAG_TIMEOUT_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.embed_dimension == 0 {
            anyhow::bail!("Embedding dimension must be greater than 0");
        }
        if self.embed_batch_size == 0 {
            anyhow::bail!("Embedding batch size must be greater than 0");
        }
        if self.generator_command.split_whitespace().next().is_none() {
            anyhow::bail!("Generator command is empty");
        }
        Ok(())
    }

    /// 아티팩트 디렉토리 (<data_dir>/artifacts)
    pub fn artifacts_dir(&self) -> PathBuf {
        self.data_dir.join("artifacts")
    }
}

/// 숫자 환경변수 파싱
fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {}: {:?}", key, value))
}

/// `OLLAMA_HOST`는 스킴 없이 `host:port`로 설정되는 경우가 많음
fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

// ============================================================================
// Tests
// ============================================================================

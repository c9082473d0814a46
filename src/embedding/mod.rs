//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 청크와 질문을 같은 벡터 공간으로 변환합니다. 두 경로 모두 같은
//! 프로바이더(같은 모델, 같은 차원)를 써야 거리 비교가 의미를 가집니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::from_config(&config)?;
//! let embedding = embedder.embed("Qual o recuo mínimo?").await?;
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::error::RagError;
use crate::knowledge::EmbeddingMatrix;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다. 항목별 순수 함수이며,
/// 배치 크기는 성능에만 영향을 주고 결과를 바꾸지 않아야 합니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

/// 텍스트 목록을 N x D 행렬로 임베딩
///
/// `batch_size`개씩 나눠 요청하며, 행 순서는 입력 순서와 같습니다.
pub async fn embed_all<E>(embedder: &E, texts: &[String], batch_size: usize) -> Result<EmbeddingMatrix>
where
    E: EmbeddingProvider + ?Sized,
{
    let dimension = embedder.dimension();
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut rows: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        tracing::info!("Embedding batch {}/{}", i + 1, total_batches);

        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            );
        }
        rows.extend(vectors);
    }

    let matrix = EmbeddingMatrix::from_rows(dimension, rows)?;
    Ok(matrix)
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// 일시적 오류 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Ollama 임베딩 구현체 (`/api/embed`)
///
/// source: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-embeddings
#[derive(Debug)]
pub struct OllamaEmbedding {
    base_url: String,
    model: String,
    client: reqwest::Client,
    dimension: usize,
}

impl OllamaEmbedding {
    /// 새 Ollama 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소 (예: `http://localhost:11434`)
    /// * `model` - 임베딩 모델 이름
    /// * `dimension` - 모델 출력 차원 (응답 검증에 사용)
    pub fn new(base_url: &str, model: &str, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            anyhow::bail!("Invalid dimension: 0");
        }

        let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
        // 로컬 Ollama는 HTTP(S)_PROXY 환경변수를 거치지 않음
        if is_loopback(base_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            dimension,
        })
    }

    /// 설정에서 생성
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(&config.ollama_url, &config.embed_model, config.embed_dimension)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    /// 비어있지 않은 텍스트들을 한 번의 요청으로 임베딩 (재시도 포함)
    async fn request(&self, input: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1));
                tracing::warn!(
                    "Embedding request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    MAX_RETRIES
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self.client.post(self.endpoint()).json(&request).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(anyhow::anyhow!(
                        "Failed to reach Ollama at {}: {}",
                        self.base_url,
                        e
                    ));
                    continue;
                }
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    last_error = Some(anyhow::anyhow!(
                        "Failed to read response body from {}: {}",
                        self.base_url,
                        e
                    ));
                    continue;
                }
            };

            if status.is_success() {
                let parsed: EmbedResponse =
                    serde_json::from_str(&body).context("Failed to parse embedding response")?;
                return Ok(parsed.embeddings);
            }

            // 429 / 5xx 는 재시도, 나머지는 즉시 실패
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(anyhow::anyhow!("Ollama API error ({}): {}", status, body));
                continue;
            }

            if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                anyhow::bail!("Ollama API error ({}): {}", status, error.error);
            }
            anyhow::bail!("Ollama API error ({}): {}", status, body);
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Embedding failed after {} retries", MAX_RETRIES)))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Ollama API 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

/// Ollama API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama API 에러 응답
#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Ollama returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // 빈 텍스트는 요청하지 않고 영벡터로 채움
        let input: Vec<&str> = texts
            .iter()
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .collect();

        let embedded = if input.is_empty() {
            Vec::new()
        } else {
            self.request(&input).await?
        };

        if embedded.len() != input.len() {
            anyhow::bail!(
                "Ollama returned {} embeddings for {} inputs",
                embedded.len(),
                input.len()
            );
        }
        for vector in &embedded {
            self.check_dimension(vector)?;
        }

        let mut embedded = embedded.into_iter();
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                results.push(vec![0.0; self.dimension]);
            } else {
                let vector = embedded
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Embedding count mismatch"))?;
                results.push(vector);
            }
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn is_loopback(base_url: &str) -> bool {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .trim_start_matches('[');
    ["localhost", "127.0.0.1", "::1]"]
        .iter()
        .any(|prefix| host.starts_with(prefix))
}

// ============================================================================
// Factory Function
// ============================================================================

/// 설정에 따른 임베딩 프로바이더 생성
pub fn create_embedder(config: &RagConfig) -> Result<OllamaEmbedding> {
    let embedder = OllamaEmbedding::from_config(config)?;
    tracing::info!(
        "Using Ollama embedding {} at {} (dimension: {})",
        config.embed_model,
        config.ollama_url,
        embedder.dimension()
    );
    Ok(embedder)
}

// ============================================================================
// Tests
// ============================================================================

//! Flat L2 Vector Index - 정확(exact) 최근접 이웃 검색
//!
//! 단일 문서 규모(수백~수천 청크)에서는 전수 비교가 충분히 빠르므로
//! 근사 인덱스 없이 모든 행과의 제곱 L2 거리를 계산합니다.
//!
//! 결과는 거리 오름차순, 동일 거리는 행 번호 오름차순으로 정렬됩니다.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RagError;

use super::vector::{squared_l2, EmbeddingMatrix};

/// 직렬화 포맷 식별자
const INDEX_FORMAT: &str = "flat-l2";
/// 직렬화 포맷 버전
const INDEX_VERSION: u32 = 1;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과 한 건
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// 임베딩 행 번호 (= 청크 위치)
    pub row: usize,
    /// 제곱 L2 거리
    pub distance: f32,
}

/// 직렬화 레이아웃
#[derive(Serialize, Deserialize)]
struct IndexFile {
    format: String,
    version: u32,
    matrix: EmbeddingMatrix,
}

// ============================================================================
// FlatL2Index
// ============================================================================

/// 전수 비교 L2 인덱스
///
/// 임베딩 행렬 외의 정보는 없으므로 행렬에서 언제든 다시 만들 수 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    matrix: EmbeddingMatrix,
}

impl FlatL2Index {
    /// 임베딩 행렬로 인덱스 생성
    pub fn build(matrix: EmbeddingMatrix) -> Self {
        tracing::debug!(
            "Built flat L2 index ({} rows, dimension {})",
            matrix.rows(),
            matrix.dimension()
        );
        Self { matrix }
    }

    /// 벡터 차원
    pub fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    /// 원본 임베딩 행렬
    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    /// 저장된 벡터 수
    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// k개 최근접 이웃 검색
    ///
    /// 빈 인덱스나 `k == 0`이면 빈 결과를 반환합니다.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RagError> {
        if query.len() != self.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        let mut neighbors: Vec<Neighbor> = self
            .matrix
            .iter_rows()
            .enumerate()
            .map(|(row, vector)| Neighbor {
                row,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// 바이트로 직렬화 (bincode)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file = IndexFile {
            format: INDEX_FORMAT.to_string(),
            version: INDEX_VERSION,
            matrix: self.matrix.clone(),
        };
        bincode::serde::encode_to_vec(&file, bincode::config::standard())
            .context("Failed to encode index")
    }

    /// 바이트에서 복원
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (file, _): (IndexFile, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .context("Failed to decode index")?;

        if file.format != INDEX_FORMAT || file.version != INDEX_VERSION {
            anyhow::bail!(
                "Unsupported index format: {} v{} (expected {} v{})",
                file.format,
                file.version,
                INDEX_FORMAT,
                INDEX_VERSION
            );
        }

        Ok(Self::build(file.matrix))
    }
}

// ============================================================================
// Tests
// ============================================================================

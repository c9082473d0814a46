//! 벡터 타입 및 유틸리티
//!
//! 청크(Passage)와 임베딩 행렬, L2 거리 계산을 제공합니다.
//! 청크 순서 = 임베딩 행 순서이며, 이 대응 관계는 `Corpus`가 보장합니다.

use serde::{Deserialize, Serialize};

use crate::error::RagError;

// ============================================================================
// Passage
// ============================================================================

/// 원문에서 잘라낸 청크 (생성 후 불변)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// 원본 문서 식별자
    #[serde(rename = "source")]
    pub source_id: String,
    /// 청크 텍스트 (원문 그대로)
    pub text: String,
    /// 원문 내 시작 바이트 오프셋
    #[serde(default)]
    pub start: usize,
    /// 원문 내 끝 바이트 오프셋 (exclusive)
    #[serde(default)]
    pub end: usize,
    /// 분할할 수 없어 chunk_size를 초과한 청크
    #[serde(default)]
    pub oversized: bool,
}

impl Passage {
    /// 오프셋 없이 생성 (테스트, 외부 입력용)
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        Self {
            source_id: source_id.into(),
            text,
            start: 0,
            end,
            oversized: false,
        }
    }
}

// ============================================================================
// EmbeddingMatrix
// ============================================================================

/// N x D 임베딩 행렬 (row-major, f32)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dimension: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// 빈 행렬
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// 행 벡터들로 생성 (모든 행의 차원이 같아야 함)
    pub fn from_rows(dimension: usize, rows: Vec<Vec<f32>>) -> Result<Self, RagError> {
        let mut matrix = Self {
            dimension,
            data: Vec::with_capacity(rows.len() * dimension),
        };
        for row in &rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// 행 추가
    pub fn push_row(&mut self, row: &[f32]) -> Result<(), RagError> {
        if row.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// 차원 D
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// 행 수 N
    pub fn rows(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// i번째 행
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// 행 순회
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 제곱 유클리드(L2) 거리
///
/// 길이가 다르면 짧은 쪽 기준으로 계산하므로, 호출 전에 차원을 검증해야 합니다.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_matrix_rows() {
        let m = EmbeddingMatrix::from_rows(2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(m.row(2), None);
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let result = EmbeddingMatrix::from_rows(2, vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let m = EmbeddingMatrix::empty(384);
        assert!(m.is_empty());
        assert_eq!(m.dimension(), 384);
        assert_eq!(m.iter_rows().count(), 0);
    }

    #[test]
    fn test_passage_serialized_field_names() {
        let p = Passage::new("codigo_obras", "Art. 1.");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["source"], "codigo_obras");
        assert_eq!(json["text"], "Art. 1.");

        // 오프셋 없는 레코드도 읽을 수 있어야 함
        let minimal: Passage =
            serde_json::from_str(r#"{"source":"x","text":"abc"}"#).unwrap();
        assert_eq!(minimal.text, "abc");
        assert!(!minimal.oversized);
    }
}

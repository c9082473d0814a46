//! 하이브리드 검색 - 벡터 검색 + 조항 규칙 통합
//!
//! 1. 소문자화한 질문을 임베딩해 top-k 청크를 찾습니다 (거리 오름차순).
//! 2. 질문이 규칙의 트리거를 포함하면 전체 청크를 원래 순서로 훑어
//!    첫 번째로 매칭되는 청크를 덧붙입니다 (규칙당 최대 1개).
//! 3. 텍스트 기준으로 중복을 제거하고, 시맨틱 결과 → 규칙 결과 순서로
//!    구분자를 넣어 컨텍스트를 만듭니다.

use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;
use crate::error::RagError;

use super::corpus::Corpus;
use super::rules::RetrievalRule;

/// 컨텍스트 내 청크 구분자
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

// ============================================================================
// Types
// ============================================================================

/// 검색 방법
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMethod {
    /// 벡터 검색 (제곱 L2 거리)
    Vector { distance: f32 },
    /// 규칙 매칭 (규칙 이름)
    Rule { name: String },
}

/// 하이브리드 검색 결과 한 건
#[derive(Debug, Clone, PartialEq)]
pub struct HybridSearchResult {
    /// 청크 위치 (= 임베딩 행 번호)
    pub position: usize,
    /// 청크 텍스트
    pub text: String,
    /// 검색 방법
    pub method: SearchMethod,
}

/// 검색 결과 (시맨틱 → 규칙 순서, 중복 없음)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<HybridSearchResult>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// 생성 단계에 넘길 컨텍스트 문자열
    pub fn context(&self) -> String {
        self.hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    fn contains_text(&self, text: &str) -> bool {
        self.hits.iter().any(|h| h.text == text)
    }
}

// ============================================================================
// HybridRetriever
// ============================================================================

/// 하이브리드 검색기
///
/// 코퍼스, 임베더, 규칙을 모두 생성자로 주입받습니다.
pub struct HybridRetriever<E> {
    corpus: Corpus,
    embedder: E,
    rules: Vec<RetrievalRule>,
    top_k: usize,
}

impl<E: EmbeddingProvider> HybridRetriever<E> {
    /// 새 하이브리드 검색기 생성
    ///
    /// 임베더 차원이 인덱스 차원과 다르면 실패합니다.
    pub fn new(
        corpus: Corpus,
        embedder: E,
        rules: Vec<RetrievalRule>,
        top_k: usize,
    ) -> Result<Self, RagError> {
        if !corpus.is_empty() && corpus.dimension() != embedder.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: corpus.dimension(),
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            corpus,
            embedder,
            rules,
            top_k,
        })
    }

    /// 하이브리드 검색
    ///
    /// # Arguments
    /// * `question` - 자연어 질문 (원문 그대로)
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let question_lower = question.to_lowercase();

        let mut result = self.search_vector(&question_lower).await?;
        let semantic_count = result.len();

        self.apply_rules(&question_lower, &mut result);

        tracing::debug!(
            "Retrieved {} passages ({} semantic, {} rule)",
            result.len(),
            semantic_count,
            result.len() - semantic_count
        );
        Ok(result)
    }

    /// 벡터 검색만 수행 (텍스트 중복 제거)
    pub async fn search_vector(&self, question_lower: &str) -> Result<RetrievalResult> {
        let mut result = RetrievalResult::default();
        if self.corpus.is_empty() || self.top_k == 0 {
            return Ok(result);
        }

        let query = self
            .embedder
            .embed(question_lower)
            .await
            .context("Failed to embed question")?;

        for (position, passage, distance) in self.corpus.search(&query, self.top_k)? {
            if result.contains_text(&passage.text) {
                continue;
            }
            result.hits.push(HybridSearchResult {
                position,
                text: passage.text.clone(),
                method: SearchMethod::Vector { distance },
            });
        }

        Ok(result)
    }

    /// 발동된 규칙마다 첫 매칭 청크를 덧붙임 (이미 있으면 건너뜀)
    pub fn apply_rules(&self, question_lower: &str, result: &mut RetrievalResult) {
        let mut seen: HashSet<String> = result.hits.iter().map(|h| h.text.clone()).collect();

        for rule in self.rules.iter().filter(|r| r.is_triggered(question_lower)) {
            let Some((position, passage)) = rule.first_match(self.corpus.passages()) else {
                tracing::debug!("Rule {} triggered but matched no passage", rule.name);
                continue;
            };

            if !seen.insert(passage.text.clone()) {
                continue;
            }

            tracing::debug!("Rule {} injected passage #{}", rule.name, position);
            result.hits.push(HybridSearchResult {
                position,
                text: passage.text.clone(),
                method: SearchMethod::Rule {
                    name: rule.name.clone(),
                },
            });
        }
    }

    /// 질문에 대한 컨텍스트 문자열
    pub async fn context_for(&self, question: &str) -> Result<String> {
        Ok(self.retrieve(question).await?.context())
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn rules(&self) -> &[RetrievalRule] {
        &self.rules
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::knowledge::rules::{default_rules, PassageMatcher};
    use crate::knowledge::{EmbeddingMatrix, Passage};

    const ART_241: &str = "Art. 241. Os recuos de frente...";
    const ART_5: &str = "Art. 5. Disposições gerais...";
    const QUESTION: &str = "Qual o recuo de uma placa publicitária?";

    /// 텍스트 → 벡터 고정 테이블 임베더 (모르는 텍스트는 영벡터)
    struct TableEmbedding {
        table: HashMap<String, Vec<f32>>,
        dimension: usize,
        seen: Mutex<Vec<String>>,
    }

    impl TableEmbedding {
        fn new(dimension: usize, entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                dimension,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0; self.dimension]))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn corpus(entries: &[(&str, Vec<f32>)]) -> Corpus {
        let passages = entries
            .iter()
            .map(|(text, _)| Passage::new("codigo_obras", *text))
            .collect();
        let rows = entries.iter().map(|(_, v)| v.clone()).collect();
        Corpus::from_embeddings(passages, EmbeddingMatrix::from_rows(2, rows).unwrap()).unwrap()
    }

    /// 질문이 Art. 5 쪽에 가깝게 임베딩되는 검색기
    fn retriever(top_k: usize) -> HybridRetriever<TableEmbedding> {
        let corpus = corpus(&[(ART_241, vec![1.0, 0.0]), (ART_5, vec![0.0, 1.0])]);
        let question = QUESTION.to_lowercase();
        let embedder = TableEmbedding::new(2, &[(question.as_str(), vec![0.1, 0.9])]);
        HybridRetriever::new(corpus, embedder, default_rules(), top_k).unwrap()
    }

    #[tokio::test]
    async fn test_rule_injects_passage_outside_top_k() {
        let retriever = retriever(1);
        let result = retriever.retrieve(QUESTION).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].text, ART_5);
        assert!(matches!(result.hits[0].method, SearchMethod::Vector { .. }));
        assert_eq!(result.hits[1].text, ART_241);
        assert_eq!(result.hits[1].position, 0);
        assert!(matches!(result.hits[1].method, SearchMethod::Rule { .. }));

        assert_eq!(
            result.context(),
            format!("{}{}{}", ART_5, CONTEXT_SEPARATOR, ART_241)
        );
    }

    #[tokio::test]
    async fn test_question_is_embedded_lowercased() {
        let retriever = retriever(1);
        retriever.retrieve(QUESTION).await.unwrap();

        let seen = retriever.embedder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![QUESTION.to_lowercase()]);
    }

    #[tokio::test]
    async fn test_rule_hit_already_in_semantic_hits_appears_once() {
        let retriever = retriever(2);
        let result = retriever.retrieve(QUESTION).await.unwrap();

        assert_eq!(result.len(), 2);
        let context = result.context();
        assert_eq!(context.matches("Art. 241").count(), 1);
        assert!(result
            .hits
            .iter()
            .all(|h| matches!(h.method, SearchMethod::Vector { .. })));
    }

    #[tokio::test]
    async fn test_no_trigger_means_semantic_only() {
        let retriever = retriever(1);
        let result = retriever
            .retrieve("Quais são as disposições gerais?")
            .await
            .unwrap();

        // 영벡터 질문: 동일 거리 → 행 번호 순
        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].text, ART_241);
    }

    #[tokio::test]
    async fn test_semantic_hits_deduplicated_by_text() {
        let corpus = corpus(&[
            ("mesmo texto", vec![0.0, 0.0]),
            ("mesmo texto", vec![0.0, 0.1]),
            ("outro texto", vec![5.0, 5.0]),
        ]);
        let retriever =
            HybridRetriever::new(corpus, TableEmbedding::new(2, &[]), vec![], 3).unwrap();

        let result = retriever.retrieve("qualquer").await.unwrap();
        let texts: Vec<&str> = result.hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["mesmo texto", "outro texto"]);
    }

    #[tokio::test]
    async fn test_rules_applied_in_order_one_match_each() {
        let corpus = corpus(&[
            ("Art. 10. calçadas A", vec![9.0, 9.0]),
            ("Art. 10. calçadas B", vec![9.0, 9.0]),
            ("Art. 20. marquises", vec![8.0, 8.0]),
            ("Art. 1. objeto", vec![0.0, 0.0]),
        ]);
        let rules = vec![
            RetrievalRule {
                name: "marquise".to_string(),
                triggers: vec!["marquise".to_string()],
                matcher: PassageMatcher::ContainsAll {
                    terms: vec!["Art. 20".to_string()],
                },
            },
            RetrievalRule {
                name: "calcada".to_string(),
                triggers: vec!["calçada".to_string()],
                matcher: PassageMatcher::ContainsAny {
                    terms: vec!["calçadas".to_string()],
                },
            },
        ];
        let retriever = HybridRetriever::new(corpus, TableEmbedding::new(2, &[]), rules, 1).unwrap();

        let result = retriever
            .retrieve("Calçada e marquise: qual a regra?")
            .await
            .unwrap();
        let texts: Vec<&str> = result.hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Art. 1. objeto", "Art. 20. marquises", "Art. 10. calçadas A"]
        );
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_empty_context() {
        let retriever = HybridRetriever::new(
            Corpus::empty(2),
            TableEmbedding::new(2, &[]),
            default_rules(),
            3,
        )
        .unwrap();

        let result = retriever.retrieve(QUESTION).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(retriever.context_for(QUESTION).await.unwrap(), "");
        assert!(retriever.embedder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let corpus = corpus(&[(ART_5, vec![0.0, 1.0])]);
        let result = HybridRetriever::new(corpus, TableEmbedding::new(3, &[]), vec![], 3);
        assert!(matches!(
            result,
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}

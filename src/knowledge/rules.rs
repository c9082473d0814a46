//! 조항 규칙 검색
//!
//! 시맨틱 검색이 놓칠 수 있는 핵심 조항을 키워드 트리거로 보강합니다.
//! 규칙은 (트리거 키워드, 청크 매처) 쌍의 목록이며 순서대로 평가됩니다.
//! JSON 파일로 교체할 수 있습니다:
//!
//! ```json
//! [
//!   {
//!     "name": "art-241-recuos",
//!     "triggers": ["recuo", "painel"],
//!     "matcher": { "type": "contains_all", "terms": ["Art. 241", "recuos de frente"] }
//!   }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RagError;

use super::vector::Passage;

// ============================================================================
// PassageMatcher
// ============================================================================

/// 청크 매칭 조건 (대소문자 구분, 원문 그대로 비교)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PassageMatcher {
    /// 모든 문구를 포함
    ContainsAll { terms: Vec<String> },
    /// 하나 이상의 문구를 포함
    ContainsAny { terms: Vec<String> },
}

impl PassageMatcher {
    /// 청크가 조건을 만족하는지
    pub fn matches(&self, passage: &Passage) -> bool {
        match self {
            Self::ContainsAll { terms } => {
                !terms.is_empty() && terms.iter().all(|t| passage.text.contains(t.as_str()))
            }
            Self::ContainsAny { terms } => terms.iter().any(|t| passage.text.contains(t.as_str())),
        }
    }
}

// ============================================================================
// RetrievalRule
// ============================================================================

/// 키워드 트리거 규칙
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRule {
    /// 규칙 이름 (로그용)
    pub name: String,
    /// 질문에 하나라도 포함되면 규칙 발동 (대소문자 무시)
    pub triggers: Vec<String>,
    /// 주입할 청크 조건
    pub matcher: PassageMatcher,
}

impl RetrievalRule {
    /// 소문자화된 질문이 트리거를 포함하는지
    pub fn is_triggered(&self, question_lower: &str) -> bool {
        self.triggers
            .iter()
            .any(|t| !t.is_empty() && question_lower.contains(&t.to_lowercase()))
    }

    /// 원래 순서로 훑어 처음 매칭되는 청크 (위치, 청크)
    pub fn first_match<'a>(&self, passages: &'a [Passage]) -> Option<(usize, &'a Passage)> {
        passages
            .iter()
            .enumerate()
            .find(|(_, passage)| self.matcher.matches(passage))
    }
}

// ============================================================================
// Rule Tables
// ============================================================================

/// 기본 규칙: 광고물/옥외 패널 질문 → Art. 241 (전면 후퇴선)
pub fn default_rules() -> Vec<RetrievalRule> {
    vec![RetrievalRule {
        name: "art-241-recuos-de-frente".to_string(),
        triggers: ["recuo", "frente", "painel", "publicitário", "out-door", "anúncio"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        matcher: PassageMatcher::ContainsAll {
            terms: vec!["Art. 241".to_string(), "recuos de frente".to_string()],
        },
    }]
}

/// JSON 규칙 파일 로드
pub fn load_rules(path: &Path) -> Result<Vec<RetrievalRule>> {
    if !path.exists() {
        return Err(RagError::missing("rules", path).into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file: {:?}", path))?;
    let rules: Vec<RetrievalRule> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse rules file: {:?}", path))?;

    tracing::debug!("Loaded {} retrieval rules from {:?}", rules.len(), path);
    Ok(rules)
}

// ============================================================================
// Tests
// ============================================================================

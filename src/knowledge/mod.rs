//! Knowledge 모듈 - 단일 문서 하이브리드 검색
//!
//! - Chunker: 조항 경계 인식 재귀 분할
//! - Index: 정확(exact) L2 최근접 이웃 검색
//! - Corpus: 청크 목록 + 인덱스 정렬 보장, 아티팩트 저장/로드
//! - Rules: 키워드 트리거 조항 주입
//! - Hybrid: 벡터 검색 + 규칙 보강 + 중복 제거

mod chunker;
mod corpus;
mod hybrid;
mod index;
mod rules;
mod vector;

// Re-exports
pub use chunker::{
    Chunker, RecursiveChunker, ChunkConfig, Separator, SplitAt,
    default_chunker, default_separators, legal_chunker,
};
pub use corpus::{ArtifactStatus, ArtifactStore, Corpus, Manifest, sha256_hex};
pub use hybrid::{
    HybridRetriever, HybridSearchResult, RetrievalResult, SearchMethod,
    CONTEXT_SEPARATOR,
};
pub use index::{FlatL2Index, Neighbor};
pub use rules::{PassageMatcher, RetrievalRule, default_rules, load_rules};
pub use vector::{EmbeddingMatrix, Passage, squared_l2};

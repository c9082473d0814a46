//! obras-rag - 건축법규(Código de Obras) 질의응답 RAG
//!
//! 법규 문서 하나를 청크로 나누고 임베딩해 정확 L2 인덱스를 만든 뒤,
//! 벡터 검색과 키워드 규칙으로 컨텍스트를 모아 로컬 LLM에 질문합니다.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod knowledge;

// Re-exports
pub use config::{RagConfig, get_data_dir};
pub use embedding::{EmbeddingProvider, OllamaEmbedding, create_embedder, embed_all};
pub use error::RagError;
pub use generation::{
    Answer, AnswerGenerator, AnswerOrchestrator, ProcessGenerator, compose_prompt,
};
pub use knowledge::{
    ArtifactStore, ChunkConfig, Chunker, Corpus, EmbeddingMatrix, FlatL2Index,
    HybridRetriever, HybridSearchResult, Manifest, Passage, RecursiveChunker,
    RetrievalResult, RetrievalRule, SearchMethod, default_chunker, default_rules,
    legal_chunker,
};

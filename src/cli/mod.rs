//! CLI 모듈
//!
//! obras-rag CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::RagConfig;
use crate::embedding::{create_embedder, embed_all, EmbeddingProvider, OllamaEmbedding};
use crate::error::RagError;
use crate::generation::{compose_prompt, AnswerOrchestrator, ProcessGenerator};
use crate::knowledge::{
    default_rules, legal_chunker, load_rules, ArtifactStore, ChunkConfig, Corpus, HybridRetriever,
    Manifest, RetrievalRule, SearchMethod,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "obras-rag")]
#[command(version, about = "건축법규 질의응답 RAG", long_about = None)]
pub struct Cli {
    /// 데이터 디렉토리 (OBRAS_RAG_DATA_DIR보다 우선)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 법규 문서를 청크/임베딩/인덱스로 변환해 저장
    Ingest {
        /// 문서 텍스트 파일
        file: PathBuf,

        /// 출처 식별자 (기본: 파일 이름)
        #[arg(long)]
        source_id: Option<String>,

        /// 최대 청크 크기 (문자 수)
        #[arg(long, default_value = "512")]
        chunk_size: usize,

        /// 인접 청크 간 공유 문자 수
        #[arg(long, default_value = "64")]
        overlap: usize,
    },

    /// 저장된 임베딩으로 인덱스 재생성
    Index,

    /// 질문에 답변
    Query {
        /// 자연어 질문
        question: String,

        /// 벡터 검색 결과 수
        #[arg(short, long)]
        k: Option<usize>,

        /// 규칙 파일 (JSON, 기본: 내장 규칙)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// 프롬프트(컨텍스트) 출력 생략
        #[arg(long)]
        hide_context: bool,
    },

    /// 컨텍스트 검색만 수행 (생성 없음)
    Retrieve {
        /// 자연어 질문
        question: String,

        /// 벡터 검색 결과 수
        #[arg(short, long)]
        k: Option<usize>,

        /// 규칙 파일 (JSON, 기본: 내장 규칙)
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.data_dir)?;

    match cli.command {
        Commands::Ingest {
            file,
            source_id,
            chunk_size,
            overlap,
        } => cmd_ingest(&config, &file, source_id, chunk_size, overlap).await,
        Commands::Index => cmd_index(&config),
        Commands::Query {
            question,
            k,
            rules,
            hide_context,
        } => cmd_query(&config, &question, k, rules, hide_context).await,
        Commands::Retrieve { question, k, rules } => {
            cmd_retrieve(&config, &question, k, rules).await
        }
        Commands::Status => cmd_status(&config),
    }
}

/// 환경변수 설정 + CLI 오버라이드
fn resolve_config(data_dir: Option<PathBuf>) -> Result<RagConfig> {
    let mut config = RagConfig::from_env().context("설정 로드 실패")?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 수집 명령어 (ingest)
///
/// 청크 분할 → 임베딩 → 인덱스 생성 → 아티팩트 저장.
/// 중간에 실패하면 기존 아티팩트는 그대로 남습니다.
async fn cmd_ingest(
    config: &RagConfig,
    file: &Path,
    source_id: Option<String>,
    chunk_size: usize,
    overlap: usize,
) -> Result<()> {
    if chunk_size == 0 {
        bail!("--chunk-size는 0보다 커야 합니다");
    }
    if overlap >= chunk_size {
        bail!("--overlap({})은 --chunk-size({})보다 작아야 합니다", overlap, chunk_size);
    }
    if !file.exists() {
        return Err(RagError::missing("document", file).into());
    }

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("문서 읽기 실패: {:?}", file))?;
    let source_id = source_id.unwrap_or_else(|| default_source_id(file));

    // 1. 청크 분할
    println!("[*] 청크 분할 중: {}", file.display());
    let chunker = legal_chunker(ChunkConfig {
        chunk_size,
        overlap,
    });
    let passages = chunker.chunk(&source_id, &text);
    let oversized = passages.iter().filter(|p| p.oversized).count();
    println!("    청크: {} 개 (크기 초과: {})", passages.len(), oversized);

    if passages.is_empty() {
        println!("[!] 문서에 텍스트가 없습니다. 빈 코퍼스를 저장합니다.");
    }

    // 2. 임베딩
    let embedder = create_embedder(config)?;
    println!("[*] 임베딩 생성 중 ({})...", embedder.name());
    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let matrix = embed_all(&embedder, &texts, config.embed_batch_size)
        .await
        .context("임베딩 생성 실패")?;

    // 3. 인덱스 + 저장
    let corpus = Corpus::from_embeddings(passages, matrix)?;
    let manifest = Manifest::describe(
        &corpus,
        &source_id,
        &text,
        &config.embed_model,
        chunk_size,
        overlap,
    );

    let store = ArtifactStore::new(config.artifacts_dir());
    store.save(&corpus, &manifest).context("아티팩트 저장 실패")?;

    println!("[OK] 인덱스 생성 완료: {} 청크", corpus.len());
    println!("     출처: {}", source_id);
    println!("     저장 위치: {}", store.dir().display());

    Ok(())
}

/// 인덱스 재생성 명령어 (index)
fn cmd_index(config: &RagConfig) -> Result<()> {
    let store = ArtifactStore::new(config.artifacts_dir());

    println!("[*] 인덱스 재생성 중: {}", store.dir().display());
    let corpus = store.rebuild_index().context("인덱스 재생성 실패")?;

    println!(
        "[OK] 인덱스 재생성 완료: {} 청크 (차원: {})",
        corpus.len(),
        corpus.dimension()
    );
    Ok(())
}

/// 질의 명령어 (query)
///
/// 검색/아티팩트 오류는 전파하고, 생성 오류는 `[Erro]` 메시지로 출력합니다.
async fn cmd_query(
    config: &RagConfig,
    question: &str,
    k: Option<usize>,
    rules: Option<PathBuf>,
    hide_context: bool,
) -> Result<()> {
    let retriever = open_retriever(config, k, rules.as_deref())?;
    let context = retriever
        .context_for(question)
        .await
        .context("컨텍스트 검색 실패")?;

    if !hide_context {
        println!("{}", compose_prompt(&context, question));
    }

    let generator = ProcessGenerator::from_config(config)?;
    let orchestrator = AnswerOrchestrator::new(generator);
    let answer = orchestrator.answer_or_report(&context, question).await;

    println!("\nResposta:\n{}", answer);
    Ok(())
}

/// 검색 명령어 (retrieve)
async fn cmd_retrieve(
    config: &RagConfig,
    question: &str,
    k: Option<usize>,
    rules: Option<PathBuf>,
) -> Result<()> {
    let retriever = open_retriever(config, k, rules.as_deref())?;

    println!(
        "[*] 검색 중: \"{}\" (코퍼스 {} 청크, top-{}, 규칙 {} 개)",
        question,
        retriever.corpus().len(),
        retriever.top_k(),
        retriever.rules().len()
    );
    let result = retriever.retrieve(question).await.context("검색 실패")?;

    if result.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", result.len());
    for (i, hit) in result.hits.iter().enumerate() {
        let method_str = match &hit.method {
            SearchMethod::Vector { distance } => format!("VEC {:.4}", distance),
            SearchMethod::Rule { name } => format!("RULE {}", name),
        };
        println!("{}. [{}] 청크 #{}", i + 1, method_str, hit.position);
        println!("   내용: {}", truncate_text(&hit.text, 200));
        println!();
    }

    println!("{}", result.context());
    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &RagConfig) -> Result<()> {
    println!("obras-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());
    println!(
        "[*] 임베딩: {} @ {} (차원: {})",
        config.embed_model, config.ollama_url, config.embed_dimension
    );
    println!(
        "[*] 생성기: {} (타임아웃: {}s)",
        config.generator_command, config.generation_timeout_secs
    );

    let store = ArtifactStore::new(config.artifacts_dir());
    let status = store.status();
    for (name, present, path) in [
        ("passages", status.passages, store.passages_path()),
        ("embeddings", status.embeddings, store.embeddings_path()),
        ("index", status.index, store.index_path()),
        ("manifest", status.manifest, store.manifest_path()),
    ] {
        if present {
            let size = std::fs::metadata(&path).map(|m| m.len() as usize).unwrap_or(0);
            println!("[OK] {:<10} {}", name, format_bytes(size));
        } else {
            println!("[!] {:<10} 없음", name);
        }
    }

    match store.load_manifest() {
        Ok(Some(manifest)) => {
            println!();
            println!("[OK] 출처: {}", manifest.source_id);
            println!(
                "     청크: {} 개 (크기 초과: {}), chunk_size {} / overlap {}",
                manifest.passage_count,
                manifest.oversized_count,
                manifest.chunk_size,
                manifest.overlap
            );
            println!(
                "     임베딩: {} (차원: {})",
                manifest.embed_model, manifest.dimension
            );
            println!(
                "     생성 시각: {}",
                manifest.created_at.format("%Y-%m-%d %H:%M")
            );
            if manifest.embed_model != config.embed_model {
                println!(
                    "[!] 현재 임베딩 모델({})이 인덱스 모델과 다릅니다",
                    config.embed_model
                );
            }
        }
        Ok(None) => {
            println!("\n[!] 수집된 문서가 없습니다. `obras-rag ingest <file>`로 생성하세요.");
        }
        Err(e) => {
            println!("\n[!] manifest 읽기 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 아티팩트 로드 + 검색기 구성
fn open_retriever(
    config: &RagConfig,
    k: Option<usize>,
    rules: Option<&Path>,
) -> Result<HybridRetriever<OllamaEmbedding>> {
    let store = ArtifactStore::new(config.artifacts_dir());
    let corpus = store
        .load_for_model(&config.embed_model, config.embed_dimension)
        .context("아티팩트 로드 실패")?;
    let rules = load_retrieval_rules(rules)?;
    let embedder = create_embedder(config)?;

    tracing::debug!(
        "Loaded corpus ({} passages, {} rules)",
        corpus.len(),
        rules.len()
    );

    let retriever = HybridRetriever::new(corpus, embedder, rules, k.unwrap_or(config.top_k))?;
    Ok(retriever)
}

/// 규칙 파일 또는 내장 규칙
fn load_retrieval_rules(path: Option<&Path>) -> Result<Vec<RetrievalRule>> {
    match path {
        Some(path) => load_rules(path),
        None => Ok(default_rules()),
    }
}

/// 파일 이름을 출처 식별자로
fn default_source_id(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string()
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

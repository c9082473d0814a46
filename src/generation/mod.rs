//! 답변 생성 모듈
//!
//! 검색된 컨텍스트와 질문으로 프롬프트를 만들고 외부 LLM 프로세스
//! (기본: `ollama run llama3`)에 stdin으로 전달합니다.
//! 재시도는 하지 않으며, 타임아웃을 넘기면 프로세스를 종료합니다.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::RagConfig;
use crate::error::RagError;

// ============================================================================
// Prompt
// ============================================================================

/// 고정 프롬프트 템플릿 (지시문 → 컨텍스트 → 질문 → 답변 유도)
pub fn compose_prompt(context: &str, question: &str) -> String {
    format!(
        "\nVocê é um assistente jurídico especializado em códigos de obras municipais.\n\
         Responda apenas com base no contexto fornecido.\n\
         \n\
         Contexto:\n\
         {context}\n\
         \n\
         Pergunta: {question}\n\
         Resposta (cite o artigo se possível):\n",
        context = context,
        question = question
    )
}

// ============================================================================
// AnswerGenerator Trait
// ============================================================================

/// 텍스트 생성기 트레이트
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// 프롬프트 하나로 응답 텍스트 하나를 생성
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// 생성기 이름
    fn name(&self) -> &str;
}

// ============================================================================
// ProcessGenerator
// ============================================================================

/// 외부 프로세스 생성기 (프롬프트 → stdin, 응답 ← stdout)
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessGenerator {
    /// 프로그램, 인자, 타임아웃으로 생성
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// 공백으로 구분된 명령 문자열에서 생성 (예: `ollama run llama3`)
    pub fn from_command(command: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Generator command is empty"))?;
        Ok(Self::new(program, parts.collect(), timeout))
    }

    /// 설정에서 생성
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::from_command(
            &config.generator_command,
            Duration::from_secs(config.generation_timeout_secs),
        )
    }

    async fn run(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RagError::Generation(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // 프로세스가 입력을 읽기 전에 종료하면 BrokenPipe → 종료 코드로 판단
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(RagError::Generation(format!("failed to write prompt: {}", e)).into());
                }
                tracing::debug!("Generator closed stdin early: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RagError::Generation(format!("failed to wait for {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RagError::Generation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let response = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if response.is_empty() {
            return Err(RagError::Generation(format!("{} returned an empty response", self.program)).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl AnswerGenerator for ProcessGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Invoking {} {:?} ({} bytes prompt)",
            self.program,
            self.args,
            prompt.len()
        );

        match tokio::time::timeout(self.timeout, self.run(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(RagError::GenerationTimeout(self.timeout.as_secs()).into()),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

// ============================================================================
// AnswerOrchestrator
// ============================================================================

/// 생성 결과
#[derive(Debug, Clone)]
pub struct Answer {
    /// 전달한 프롬프트
    pub prompt: String,
    /// 생성기 원문 응답
    pub text: String,
}

/// 프롬프트 구성 + 생성기 호출
pub struct AnswerOrchestrator<G> {
    generator: G,
}

impl<G: AnswerGenerator> AnswerOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// 답변 생성 (실패 시 에러 전파)
    pub async fn answer(&self, context: &str, question: &str) -> Result<Answer> {
        let prompt = compose_prompt(context, question);
        let text = self.generator.generate(&prompt).await?;
        Ok(Answer { prompt, text })
    }

    /// 답변 생성 (실패 시 `[Erro] ...` 메시지 반환)
    pub async fn answer_or_report(&self, context: &str, question: &str) -> String {
        match self.answer(context, question).await {
            Ok(answer) => answer.text,
            Err(e) => {
                tracing::warn!("Generation via {} failed: {:#}", self.generator.name(), e);
                format!("[Erro] {:#}", e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Text Chunking Module
//!
//! 법령 구조(조항, 항, 단락, 문장)를 인식하는 재귀 분할기입니다.
//! 우선순위가 높은 구분자부터 시도하고, 조각이 여전히 `chunk_size`를 넘으면
//! 다음 구분자로 내려갑니다. 인접 청크는 `overlap` 문자만큼 원문을 공유합니다.
//!
//! 길이는 모두 문자(char) 단위입니다. 오프셋은 바이트 단위입니다.

use std::ops::Range;

use regex::Regex;

use super::vector::Passage;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub chunk_size: usize,
    /// 인접 청크 간 공유 문자 수
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap: 64,
        }
    }
}

// ============================================================================
// Separators
// ============================================================================

/// 구분자 매치 위치에서 자르는 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAt {
    /// 매치 앞에서 자름 (구분자는 다음 조각의 머리)
    Before,
    /// 매치 뒤에서 자름 (구분자는 앞 조각의 꼬리)
    After,
}

/// 분할 경계 패턴
#[derive(Debug, Clone)]
pub struct Separator {
    pattern: Regex,
    split_at: SplitAt,
}

impl Separator {
    /// 정규식과 분할 방향으로 생성
    pub fn new(pattern: &str, split_at: SplitAt) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            split_at,
        })
    }

    /// 슬라이스 내부의 분할 지점 (0과 끝은 제외, 오름차순)
    fn cut_points(&self, slice: &str) -> Vec<usize> {
        let mut cuts: Vec<usize> = self
            .pattern
            .find_iter(slice)
            .map(|m| match self.split_at {
                SplitAt::Before => m.start(),
                SplitAt::After => m.end(),
            })
            .filter(|&pos| pos > 0 && pos < slice.len())
            .collect();
        cuts.dedup();
        cuts
    }
}

/// 기본 구분자 (우선순위 순)
///
/// 조항(`Art. N`) → 항(`§`) → 단락(`Parágrafo`) → 문장 끝 → 빈 줄
pub fn default_separators() -> Vec<Separator> {
    [
        (r"\nArt\. \d+", SplitAt::Before),
        (r"\n§", SplitAt::Before),
        (r"\nParágrafo", SplitAt::Before),
        (r"\.\n", SplitAt::After),
        (r"\n\n", SplitAt::After),
    ]
    .into_iter()
    .map(|(pattern, split_at)| {
        Separator::new(pattern, split_at).expect("static separator pattern must compile")
    })
    .collect()
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할 (순서 보존, 결정적)
    fn chunk(&self, source_id: &str, text: &str) -> Vec<Passage>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// RecursiveChunker
// ============================================================================

/// 재귀 구분자 청커
pub struct RecursiveChunker {
    config: ChunkConfig,
    separators: Vec<Separator>,
}

impl RecursiveChunker {
    /// 설정과 구분자 목록으로 생성
    pub fn new(config: ChunkConfig, separators: Vec<Separator>) -> Self {
        Self { config, separators }
    }

    /// 기본 설정 (512/64, 법령 구분자)
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default(), default_separators())
    }

    /// 설정 반환
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// `range`를 chunk_size 이하 조각들로 분할
    ///
    /// 어떤 구분자로도 나눌 수 없는 조각은 크기와 무관하게 그대로 남깁니다.
    fn split_ranges(&self, text: &str, range: Range<usize>, level: usize, out: &mut Vec<Range<usize>>) {
        if char_len(&text[range.clone()]) <= self.config.chunk_size {
            out.push(range);
            return;
        }

        for (i, separator) in self.separators.iter().enumerate().skip(level) {
            let cuts = separator.cut_points(&text[range.clone()]);
            if cuts.is_empty() {
                continue;
            }

            let mut piece_start = range.start;
            for cut in cuts
                .into_iter()
                .map(|c| range.start + c)
                .chain(std::iter::once(range.end))
            {
                if cut > piece_start {
                    self.split_ranges(text, piece_start..cut, i + 1, out);
                }
                piece_start = cut;
            }
            return;
        }

        tracing::debug!(
            "Unsplittable run of {} chars at byte {}",
            char_len(&text[range.clone()]),
            range.start
        );
        out.push(range);
    }

    /// 인접 조각을 chunk_size까지 병합하고 오버랩 적용
    fn merge(&self, source_id: &str, text: &str, pieces: Vec<Range<usize>>) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut window: Option<Range<usize>> = None;
        let mut previous: Option<Range<usize>> = None;

        for piece in pieces {
            match window.take() {
                Some(current) if char_len(&text[current.start..piece.end]) <= self.config.chunk_size => {
                    window = Some(current.start..piece.end);
                    continue;
                }
                Some(current) => {
                    self.emit(&mut passages, source_id, text, current.clone());
                    previous = Some(current);
                }
                None => {}
            }

            let start = match &previous {
                Some(prev) => self.overlap_start(text, prev, &piece),
                None => piece.start,
            };
            window = Some(start..piece.end);
        }

        if let Some(current) = window {
            self.emit(&mut passages, source_id, text, current);
        }

        passages
    }

    /// 다음 청크의 시작 위치 (이전 청크 끝에서 overlap 문자만큼 앞)
    ///
    /// 새 청크가 chunk_size를 넘지 않도록 오버랩을 줄이고,
    /// 가능하면 단어 경계에서 시작합니다.
    fn overlap_start(&self, text: &str, prev: &Range<usize>, piece: &Range<usize>) -> usize {
        let piece_len = char_len(&text[piece.clone()]);
        let allowed = self
            .config
            .overlap
            .min(self.config.chunk_size.saturating_sub(piece_len));
        if allowed == 0 {
            return piece.start;
        }

        let span = &text[prev.start..prev.end];
        let back = span
            .char_indices()
            .rev()
            .take(allowed)
            .last()
            .map(|(i, _)| prev.start + i)
            .unwrap_or(prev.end);

        // 단어 중간이면 다음 공백 뒤에서 시작
        let mid_word = back > prev.start
            && !text[..back]
                .chars()
                .next_back()
                .map(char::is_whitespace)
                .unwrap_or(true);
        if !mid_word {
            return back;
        }

        text[back..prev.end]
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| back + i + c.len_utf8())
            .unwrap_or(back)
    }

    fn emit(&self, passages: &mut Vec<Passage>, source_id: &str, text: &str, range: Range<usize>) {
        let slice = &text[range.clone()];
        if slice.trim().is_empty() {
            return;
        }

        passages.push(Passage {
            source_id: source_id.to_string(),
            text: slice.to_string(),
            start: range.start,
            end: range.end,
            oversized: char_len(slice) > self.config.chunk_size,
        });
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, source_id: &str, text: &str) -> Vec<Passage> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut pieces = Vec::new();
        self.split_ranges(text, 0..text.len(), 0, &mut pieces);
        self.merge(source_id, text, pieces)
    }

    fn name(&self) -> &'static str {
        "RecursiveChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(RecursiveChunker::with_defaults())
}

/// 크기/오버랩 지정 청커 생성 (기본 구분자)
pub fn legal_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(RecursiveChunker::new(config, default_separators()))
}

// ============================================================================
// Tests
// ============================================================================

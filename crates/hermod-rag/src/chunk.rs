//! Word-window text chunking.

/// Words per token, roughly. Token budgets are converted to word counts with it.
const WORDS_PER_TOKEN: f64 = 0.75;

pub const DEFAULT_CHUNK_TOKENS: usize = 50;
pub const DEFAULT_OVERLAP_TOKENS: usize = 5;

/// One window of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// `chunk_{n}`, numbered from 1.
    pub id: String,
    pub text: String,
    pub word_count: usize,
    pub token_count: usize,
}

/// Splits text into overlapping windows of whitespace-separated words.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_tokens: usize,
    overlap_tokens: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

impl Chunker {
    pub fn new(chunk_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            chunk_tokens,
            overlap_tokens,
        }
    }

    pub fn chunk_tokens(&self) -> usize {
        self.chunk_tokens
    }

    /// Words per window. Never zero, so chunking always advances.
    fn window_words(&self) -> usize {
        words_for_tokens(self.chunk_tokens).max(1)
    }

    fn overlap_words(&self) -> usize {
        words_for_tokens(self.overlap_tokens)
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let window = self.window_words();
        let overlap = self.overlap_words();
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + window).min(words.len());
            let chunk_text = words[start..end].join(" ");
            chunks.push(TextChunk {
                id: format!("chunk_{}", chunks.len() + 1),
                word_count: end - start,
                token_count: estimate_tokens(&chunk_text),
                text: chunk_text,
            });

            if end >= words.len() {
                break;
            }
            start = (start + 1).max(end.saturating_sub(overlap));
        }

        chunks
    }
}

fn words_for_tokens(tokens: usize) -> usize {
    (tokens as f64 * WORDS_PER_TOKEN).floor() as usize
}

/// Rough token count: the larger of the word-based and character-based guesses.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    let by_words = (words as f64 / WORDS_PER_TOKEN).floor() as usize;
    let by_chars = text.chars().count() / 4;
    by_words.max(by_chars)
}

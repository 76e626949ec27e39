//! Token-aware transcript chunking
//!
//! Splits long transcripts at speaker-turn boundaries so every chunk stays
//! under the configured token ceiling. Pure over its inputs; the only
//! external dependency is the tokenizer, whose absence is fatal for the run.

use crate::models::Chunk;
use once_cell::sync::Lazy;
use regex::Regex;
use si_common::{Error, Result};
use tiktoken_rs::CoreBPE;

/// Lines that start a new speaker turn: "Name:", "Speaker 1:", "[Speaker]:",
/// or a leading "12:34" style timestamp.
static SPEAKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:[A-Z][a-zA-Z\s]*?:|Speaker\s*\d+:|\[[^\]]+\]:|\d{1,2}:\d{2})")
        .expect("speaker pattern is valid")
});

pub struct Chunker {
    bpe: CoreBPE,
}

impl Chunker {
    /// Load the cl100k_base encoding. Failure here aborts the run: chunking
    /// without token counts cannot honor the ceiling.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::Tokenizer(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Split a transcript into ordered chunks of at most `max_tokens` tokens.
    ///
    /// Strategy: whole text if it fits; otherwise split into speaker turns
    /// (falling back to non-blank lines when no turn boundary is found) and
    /// greedily accumulate. A single turn over the ceiling is re-split by
    /// line; only an atomic line can still exceed the ceiling.
    pub fn chunk(&self, transcript_id: &str, text: &str, max_tokens: usize) -> Vec<Chunk> {
        let total_tokens = self.count_tokens(text);

        if total_tokens <= max_tokens {
            return vec![Chunk {
                transcript_id: transcript_id.to_string(),
                chunk_index: 0,
                text: text.to_string(),
                token_count: total_tokens,
            }];
        }

        let turns = {
            let turns = split_into_turns(text);
            if turns.len() <= 1 {
                split_into_lines(text)
            } else {
                turns
            }
        };

        let mut builder = ChunkBuilder::new(self, transcript_id, max_tokens);
        for turn in turns {
            let turn_tokens = self.count_tokens(turn);

            if turn_tokens > max_tokens {
                // Flush whatever is buffered, then re-split the oversized
                // turn by line with the same greedy accumulation.
                builder.flush();
                for line in split_into_lines(turn) {
                    builder.push(line, self.count_tokens(line));
                }
                continue;
            }

            builder.push(turn, turn_tokens);
        }
        let chunks = builder.finish();

        tracing::info!(
            transcript_id = %transcript_id,
            total_tokens,
            chunk_count = chunks.len(),
            "Chunked transcript"
        );
        chunks
    }
}

/// Greedy accumulator: pieces are joined with newlines; when the next piece
/// would push the joined buffer over the ceiling, the buffer is flushed
/// first. Token counts do not add across a join (the separator has its own
/// cost and BPE merges across it), so admission is decided on the joined
/// text's real count, never on a sum of per-piece counts.
struct ChunkBuilder<'a> {
    chunker: &'a Chunker,
    transcript_id: &'a str,
    max_tokens: usize,
    current: String,
    current_tokens: usize,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkBuilder<'a> {
    fn new(chunker: &'a Chunker, transcript_id: &'a str, max_tokens: usize) -> Self {
        Self {
            chunker,
            transcript_id,
            max_tokens,
            current: String::new(),
            current_tokens: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, piece: &str, piece_tokens: usize) {
        if !self.current.is_empty() {
            let mut candidate =
                String::with_capacity(self.current.len() + 1 + piece.len());
            candidate.push_str(&self.current);
            candidate.push('\n');
            candidate.push_str(piece);
            let candidate_tokens = self.chunker.count_tokens(&candidate);
            if candidate_tokens <= self.max_tokens {
                self.current = candidate;
                self.current_tokens = candidate_tokens;
                return;
            }
            self.flush();
        }
        self.current.push_str(piece);
        self.current_tokens = piece_tokens;
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.current);
        self.chunks.push(Chunk {
            transcript_id: self.transcript_id.to_string(),
            chunk_index: self.chunks.len() as u32,
            text,
            token_count: self.current_tokens,
        });
        self.current_tokens = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Split text at speaker-turn boundaries, keeping each turn as one block.
/// Text before the first boundary becomes its own turn.
fn split_into_turns(text: &str) -> Vec<&str> {
    let mut positions: Vec<usize> = SPEAKER_PATTERN.find_iter(text).map(|m| m.start()).collect();

    if positions.is_empty() {
        return vec![text];
    }
    if positions[0] > 0 {
        positions.insert(0, 0);
    }

    let mut turns = Vec::with_capacity(positions.len());
    for (i, &start) in positions.iter().enumerate() {
        let end = positions.get(i + 1).copied().unwrap_or(text.len());
        let turn = text[start..end].trim();
        if !turn.is_empty() {
            turns.push(turn);
        }
    }
    turns
}

/// Fallback split for unstructured text: non-blank lines.
fn split_into_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|line| !line.trim().is_empty()).collect()
}

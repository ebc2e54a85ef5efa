use std::collections::VecDeque;

use crate::error::IngestError;
use crate::models::PipelineOptions;

/// Separator priority for recursive splitting. The empty string splits
/// between every character, so the recursion always terminates.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkerConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl TryFrom<PipelineOptions> for ChunkerConfig {
    type Error = IngestError;

    fn try_from(value: PipelineOptions) -> Result<Self, IngestError> {
        Self::new(value.chunk_size, value.chunk_overlap)
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters.
///
/// The text is split on the highest-priority separator it contains;
/// segments that are still too large are re-split with the remaining
/// separators, down to single characters. Separators stay attached to the
/// front of the following segment, so no interior characters are lost.
/// Adjacent segments are then greedily merged back into windows of at most
/// `chunk_size` characters, and on every window boundary the trailing
/// segments totalling up to `chunk_overlap` characters are carried into the
/// next window. All lengths count characters, not bytes. Emitted chunks are
/// whitespace-trimmed; empty ones are dropped, so whitespace-only input
/// yields no chunks.
pub fn split_text(text: &str, config: ChunkerConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    split_recursive(text, &DEFAULT_SEPARATORS, config)
}

fn split_recursive(text: &str, separators: &[&str], config: ChunkerConfig) -> Vec<String> {
    let (separator, rest) = select_separator(text, separators);
    let pieces = split_keeping_separator(text, separator);

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();
    for piece in pieces {
        if char_len(piece) < config.chunk_size {
            fitting.push(piece);
            continue;
        }
        if !fitting.is_empty() {
            merge_pieces(&fitting, config, &mut chunks);
            fitting.clear();
        }
        if rest.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, rest, config));
        }
    }
    if !fitting.is_empty() {
        merge_pieces(&fitting, config, &mut chunks);
    }
    chunks
}

fn select_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (position, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator, &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[position + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(start, ch)| &text[start..start + ch.len_utf8()])
            .collect();
    }

    let mut boundaries: Vec<usize> = text.match_indices(separator).map(|(at, _)| at).collect();
    boundaries.push(text.len());

    let mut pieces = Vec::with_capacity(boundaries.len());
    let mut begin = 0;
    for end in boundaries {
        if end > begin {
            pieces.push(&text[begin..end]);
        }
        begin = end;
    }
    pieces
}

fn merge_pieces(pieces: &[&str], config: ChunkerConfig, chunks: &mut Vec<String>) {
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);
        if total + len > config.chunk_size && !window.is_empty() {
            push_joined(&window, chunks);
            // Retain the trailing pieces that fit inside the overlap budget
            // and still leave room for the incoming piece.
            while total > config.chunk_overlap
                || (total + len > config.chunk_size && total > 0)
            {
                match window.pop_front() {
                    Some(first) => total -= char_len(first),
                    None => break,
                }
            }
        }
        window.push_back(piece);
        total += len;
    }

    push_joined(&window, chunks);
}

fn push_joined(window: &VecDeque<&str>, chunks: &mut Vec<String>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(piece: &str) -> usize {
    piece.chars().count()
}

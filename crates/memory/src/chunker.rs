//! Recursive character text splitter.
//!
//! Splits on the highest-priority separator present in the text, merges
//! adjacent pieces up to `chunk_size` characters with `chunk_overlap`
//! characters carried into the next chunk, and recurses with the remaining
//! separators into any piece that is still too long. Falls back to single
//! characters when no separator applies. Lengths are counted in chars, so
//! multi-byte text never splits inside a code point.

use smartflow_core::memory::Fragment;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size (characters)
    pub chunk_size: usize,
    /// Overlap between consecutive chunks (characters)
    pub chunk_overlap: usize,
    /// Separators in priority order
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: ["\n\n", "\n", "。", "！", "？", ".", " "]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Default separators with the given size and overlap.
    pub fn with_size(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self::new(ChunkingConfig {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            ..ChunkingConfig::default()
        })
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    /// Split each fragment, copying its metadata onto every chunk.
    pub fn split_fragments(&self, fragments: &[Fragment]) -> Vec<Fragment> {
        fragments
            .iter()
            .flat_map(|f| {
                self.split(&f.content)
                    .into_iter()
                    .map(|chunk| Fragment::new(chunk, f.metadata.clone()))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = match separators.iter().position(|s| text.contains(s.as_str())) {
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => ("", &separators[separators.len()..]),
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) <= self.config.chunk_size {
                pending.push(piece);
            } else {
                if !pending.is_empty() {
                    chunks.extend(self.merge(&pending));
                    pending.clear();
                }
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, keeping a tail of up to
    /// `chunk_overlap` characters as the start of the next chunk.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > size && !current.is_empty() {
                push_trimmed(&mut chunks, &current);
                while total > overlap || (total + len > size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }
        push_trimmed(&mut chunks, &current);
        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, parts: &VecDeque<&str>) {
    let joined: String = parts.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, leaving it attached to the end of each piece.
/// An empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut pieces: Vec<String> = text
        .split_inclusive(separator)
        .map(String::from)
        .collect();
    pieces.retain(|p| !p.is_empty());
    pieces
}

//! Recursive separator-based chunking with overlap.
//!
//! Text is split on the first separator (in priority order) that occurs in
//! it; pieces smaller than `chunk_size` are merged greedily, larger pieces are
//! split again with the remaining separators. Consecutive chunks share up to
//! `overlap` characters of trailing/leading context. Lengths are counted in
//! characters. All work happens on byte spans of the original text, so every
//! chunk is a contiguous slice of its document.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::types::{Chunk, RawDocument};

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_OVERLAP: usize = 100;

/// Paragraph break, line break, word boundary, character boundary.
pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap, separators: default_separators() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(Error::Config("at least one separator is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Chunks of all documents, in document order then intra-document order.
    pub fn split(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split_document(doc)).collect()
    }

    pub fn split_document(&self, document: &RawDocument) -> Vec<Chunk> {
        let text = document.text.as_str();
        self.split_spans(text, 0..text.len(), &self.config.separators)
            .into_iter()
            .filter(|span| !text[span.clone()].trim().is_empty())
            .enumerate()
            .map(|(sequence_index, span)| Chunk {
                text: text[span.clone()].to_string(),
                source: document.source.clone(),
                sequence_index,
                span,
            })
            .collect()
    }

    fn split_spans(&self, text: &str, range: Range<usize>, separators: &[String]) -> Vec<Range<usize>> {
        let segment = &text[range.clone()];
        let (separator, remaining) = pick_separator(segment, separators);

        let mut spans = Vec::new();
        let mut small = Vec::new();
        for piece in piece_spans(segment, separator) {
            let piece = (piece.start + range.start)..(piece.end + range.start);
            let len = char_len(text, &piece);
            if len < self.config.chunk_size {
                small.push((piece, len));
                continue;
            }
            if !small.is_empty() {
                spans.extend(self.merge_spans(text, &small));
                small.clear();
            }
            if remaining.is_empty() {
                // Indivisible with the configured separators; kept oversized.
                spans.push(piece);
            } else {
                spans.extend(self.split_spans(text, piece, remaining));
            }
        }
        if !small.is_empty() {
            spans.extend(self.merge_spans(text, &small));
        }
        spans
    }

    /// Greedily join adjacent pieces up to `chunk_size`, carrying up to
    /// `overlap` characters of trailing pieces into the next chunk.
    fn merge_spans(&self, text: &str, pieces: &[(Range<usize>, usize)]) -> Vec<Range<usize>> {
        let ChunkingConfig { chunk_size, overlap, .. } = self.config;
        let mut merged = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for (piece, len) in pieces {
            if total + len > chunk_size && !window.is_empty() {
                merged.extend(trimmed_join(text, &window));
                while total > overlap || (total + len > chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), *len));
            total += len;
        }
        merged.extend(trimmed_join(text, &window));
        merged
    }
}

/// Split `documents` with the default separators.
pub fn split(documents: &[RawDocument], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(ChunkingConfig::new(chunk_size, overlap))?.split(documents))
}

/// First separator present in `segment`, plus the finer separators after it.
/// The empty separator always matches and ends the recursion.
fn pick_separator<'a>(segment: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if segment.contains(sep.as_str()) {
            return (sep, &separators[i + 1..]);
        }
    }
    let last = separators.last().map_or("", String::as_str);
    (last, &[])
}

/// Byte spans of the pieces of `segment`. Each separator stays attached to
/// the start of the piece that follows it, so pieces tile the segment.
fn piece_spans(segment: &str, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return segment.char_indices().map(|(i, c)| i..i + c.len_utf8()).collect();
    }
    let mut bounds = vec![0];
    bounds.extend(segment.match_indices(separator).map(|(i, _)| i));
    bounds.push(segment.len());
    bounds
        .windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| w[0]..w[1])
        .collect()
}

fn trimmed_join(text: &str, window: &VecDeque<(Range<usize>, usize)>) -> Option<Range<usize>> {
    let start = window.front()?.0.start;
    let end = window.back()?.0.end;
    let joined = &text[start..end];
    if joined.trim().is_empty() {
        return None;
    }
    let lead = joined.len() - joined.trim_start().len();
    let trail = joined.len() - joined.trim_end().len();
    Some((start + lead)..(end - trail))
}

fn char_len(text: &str, span: &Range<usize>) -> usize {
    text[span.clone()].chars().count()
}

//! Overlapping window chunker with natural-breakpoint preference.
//!
//! Splits [`Document`]s into [`Chunk`]s of at most `chunk_size` characters,
//! where each chunk repeats the last `chunk_overlap` characters of its
//! predecessor. The final chunk of a document may absorb a short tail and
//! run to `chunk_size + chunk_overlap - 1` characters. Sizes are counted in
//! `char`s, never bytes, and every cut lands on a UTF-8 boundary.
//!
//! # Algorithm
//!
//! 1. Open a window of `chunk_size` chars at `start`.
//! 2. If the window does not reach the end of the text, move its end back to
//!    the best breakpoint in the window's back half: the last paragraph break
//!    (`\n\n`), else the last sentence end, else the last whitespace. With no
//!    breakpoint the window is cut hard at `chunk_size`.
//! 3. If fewer than `chunk_overlap` chars would remain after the window, they
//!    are absorbed into it rather than emitted as a near-duplicate chunk.
//! 4. The next window starts `chunk_overlap` chars before the current end.
//!
//! Without breakpoints consecutive starts are exactly `chunk_size -
//! chunk_overlap` apart.
//!
//! # Example
//!
//! ```rust
//! use doc_summarizer_core::chunk::split;
//! use doc_summarizer_core::models::Document;
//!
//! let doc = Document::new("a.txt", "x".repeat(3000));
//! let chunks = split(&[doc], 1536, 128).unwrap();
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].offset, 1408);
//! ```

use std::collections::HashMap;

use crate::error::ChunkError;
use crate::models::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 1536;
pub const DEFAULT_CHUNK_OVERLAP: usize = 128;

const SENTENCE_ENDS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

/// Check that `chunk_size > 0` and `chunk_overlap < chunk_size`.
pub fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<(), ChunkError> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        return Err(ChunkError::InvalidParameters {
            chunk_size,
            chunk_overlap,
        });
    }
    Ok(())
}

/// Split documents into overlapping chunks.
///
/// `sequence_index` starts at 0 for each source file and keeps ascending
/// across every document of that file (e.g. the pages of a PDF), in input
/// order. Blank documents produce no chunks.
pub fn split(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, ChunkError> {
    validate(chunk_size, chunk_overlap)?;

    let mut next_index: HashMap<&str, usize> = HashMap::new();
    let mut chunks = Vec::new();

    for doc in documents {
        let counter = next_index.entry(doc.source_file.as_str()).or_insert(0);
        for (offset, text) in windows(&doc.content, chunk_size, chunk_overlap) {
            chunks.push(Chunk {
                content: text.to_string(),
                source_file: doc.source_file.clone(),
                sequence_index: *counter,
                page: doc.page,
                offset,
            });
            *counter += 1;
        }
    }

    Ok(chunks)
}

/// Produce `(char_offset, slice)` windows over `text`.
fn windows(text: &str, size: usize, overlap: usize) -> Vec<(usize, &str)> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;

    let mut out = Vec::new();
    let mut start = 0;

    loop {
        let mut end = (start + size).min(total);
        if end < total {
            end = find_break(text, &bounds, start, end, overlap);
            if total - end < overlap {
                end = total;
            }
        }

        out.push((start, &text[bounds[start]..bounds[end]]));

        if end == total {
            break;
        }
        start = end - overlap;
    }

    out
}

/// Pick the window end: the best breakpoint in the back half, else `end`.
///
/// Candidates must leave more than `overlap` chars in the window so the
/// next window always starts after `start`.
fn find_break(text: &str, bounds: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    let lo = (start + (end - start) / 2).max(start + overlap + 1);
    if lo >= end {
        return end;
    }

    let base = bounds[lo];
    let region = &text[base..bounds[end]];

    let paragraph = region.rfind("\n\n").map(|p| p + 2);
    let sentence = || {
        SENTENCE_ENDS
            .iter()
            .filter_map(|sep| region.rfind(sep).map(|p| p + sep.len()))
            .max()
    };
    let word = || {
        region
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(p, c)| p + c.len_utf8())
    };

    match paragraph.or_else(sentence).or_else(word) {
        Some(rel) => bounds
            .binary_search(&(base + rel))
            .unwrap_or(end)
            .min(end),
        None => end,
    }
}

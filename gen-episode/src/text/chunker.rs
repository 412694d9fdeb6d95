//! Fixed-size text chunking for TTS processing.
//!
//! Chunks are cut every `max_size` characters with no regard for word or
//! sentence boundaries. Concatenating the chunks in index order gives back the
//! input exactly.

use super::TextChunk;

/// Default chunk size in characters (the speech API's input limit).
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default synthesis price per character ($15.00 / 1M characters).
pub const DEFAULT_COST_PER_CHAR: f64 = 15e-6;

/// Split text into consecutive chunks of at most `max_size` characters.
///
/// Every chunk except the last holds exactly `max_size` characters. Empty
/// input yields no chunks. A `max_size` of zero is treated as one.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<TextChunk> {
    let max_size = max_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == max_size {
            chunks.push(TextChunk::new(chunks.len(), &text[start..offset]));
            start = offset;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(TextChunk::new(chunks.len(), &text[start..]));
    }

    chunks
}

/// Estimated synthesis cost in dollars for `text`. Informational only.
pub fn estimate_cost(text: &str, cost_per_char: f64) -> f64 {
    text.chars().count() as f64 * cost_per_char
}

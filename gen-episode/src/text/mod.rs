//! Text processing for TTS: fixed-size chunking and cost estimation.

pub mod chunker;

pub use chunker::{chunk_text, estimate_cost};

/// A slice of the source text submitted as one synthesis unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in the document (0-indexed, contiguous)
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Length of the chunk in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

//! Audio assembly: chunk file naming, ordered segment planning and merging.
//!
//! Chunk files are named `{index:05}.mp3`. Ordering always goes through the
//! parsed numeric index, never the file name string, so the contract holds
//! past the padding width as well.

pub mod assembler;

pub use assembler::{
    AssemblyError, AudioMerger, MergeMethod, assemble, create_merger, plan_segments,
};

use std::path::Path;

/// Extension of chunk and episode audio files.
pub const AUDIO_EXTENSION: &str = "mp3";

/// File name for the audio of chunk `index`.
pub fn chunk_file_name(index: usize) -> String {
    format!("{:05}.{}", index, AUDIO_EXTENSION)
}

/// Recover the chunk index from a chunk file path, if it is one.
pub fn chunk_index_from_path(path: &Path) -> Option<usize> {
    if path.extension()? != AUDIO_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

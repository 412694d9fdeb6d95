//! Synthesis worker: turns one text chunk into one audio file.
//!
//! The worker never returns an error. Every failure (service, transport,
//! file system) becomes a [`ChunkResult`] with a failed status, and no file is
//! left under the chunk's final name.

pub mod protocol;

pub use protocol::ChunkResult;

use crate::audio::chunk_file_name;
use crate::text::TextChunk;
use crate::tts::{SpeechRequest, SpeechSynthesizer, SynthesisError, Voice};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Synthesizes chunks with one voice into one output directory.
pub struct SynthesisWorker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: Voice,
    instructions: String,
    output_dir: PathBuf,
}

impl SynthesisWorker {
    /// Create a worker. The voice is fixed for the worker's lifetime.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice: Voice,
        instructions: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            voice,
            instructions: instructions.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Final path of the audio for chunk `index`.
    pub fn audio_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(chunk_file_name(index))
    }

    /// Synthesize one chunk and persist its audio.
    pub async fn synthesize(&self, chunk: &TextChunk) -> ChunkResult {
        let start = Instant::now();
        debug!(
            "Processing chunk {} ({} chars) with {}",
            chunk.index,
            chunk.char_len(),
            self.synthesizer.name()
        );

        match self.synthesize_to_file(chunk).await {
            Ok(path) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!("Created {} in {}ms", path.display(), elapsed);
                ChunkResult::success(chunk.index, path, elapsed)
            }
            Err(e) => {
                warn!("Chunk {} failed: {}", chunk.index, e);
                ChunkResult::failure(chunk.index, e.to_string(), start.elapsed().as_millis() as u64)
            }
        }
    }

    async fn synthesize_to_file(&self, chunk: &TextChunk) -> Result<PathBuf, SynthesisError> {
        let final_path = self.audio_path(chunk.index);
        let part_path = final_path.with_extension("mp3.part");

        // Old audio under the final name would hide a failure from the assembler.
        remove_if_exists(&final_path).await?;

        let request = SpeechRequest {
            text: &chunk.text,
            voice: self.voice,
            instructions: &self.instructions,
        };
        let audio = self.synthesizer.synthesize(&request).await?;

        if let Err(e) = tokio::fs::write(&part_path, &audio).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e.into());
        }

        Ok(final_path)
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

//! One episode run: text → chunks → parallel synthesis → assembly → upload.
//!
//! Every external collaborator is injected, so the whole run can be driven
//! with stubs.

use crate::audio::{self, AudioMerger};
use crate::coordinator::{DispatchProgress, DispatchSummary, ParallelDispatcher, RunReport};
use crate::text::{chunk_text, estimate_cost};
use crate::tts::{SpeechSynthesizer, Voice};
use crate::upload::Uploader;
use crate::worker::SynthesisWorker;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where one document's files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeLayout {
    /// Source file name without extension
    pub base_name: String,
    /// `<chunks_root>/<base_name>/`
    pub chunks_dir: PathBuf,
    /// `<library_root>/<base_name>.mp3`
    pub output_path: PathBuf,
    /// `lib/<base_name>.mp3`
    pub remote_key: String,
}

impl EpisodeLayout {
    pub fn new(base_name: &str, chunks_root: &Path, library_root: &Path) -> Self {
        let file_name = format!("{}.{}", base_name, audio::AUDIO_EXTENSION);
        Self {
            base_name: base_name.to_string(),
            chunks_dir: chunks_root.join(base_name),
            output_path: library_root.join(&file_name),
            remote_key: format!("lib/{}", file_name),
        }
    }

    /// Layout named after `source`'s file stem.
    pub fn for_source(source: &Path, chunks_root: &Path, library_root: &Path) -> Result<Self> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a name from {}", source.display()))?;
        Ok(Self::new(stem, chunks_root, library_root))
    }
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct EpisodeSettings {
    pub chunk_size: usize,
    pub cost_per_char: f64,
    pub concurrency: usize,
    pub instructions: String,
    pub allow_partial: bool,
}

/// What happened to the upload stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Skipped,
    Uploaded(String),
    Failed(String),
}

/// Result of a run that produced a merged episode.
#[derive(Debug)]
pub struct EpisodeOutcome {
    pub report: RunReport,
    pub output_path: PathBuf,
    pub output_bytes: u64,
    pub upload: UploadOutcome,
}

/// Drives one episode through every stage.
pub struct EpisodeRunner {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    merger: Box<dyn AudioMerger>,
    uploader: Option<Box<dyn Uploader>>,
    settings: EpisodeSettings,
}

impl EpisodeRunner {
    /// Create a runner. With no uploader the upload stage is skipped.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        merger: Box<dyn AudioMerger>,
        uploader: Option<Box<dyn Uploader>>,
        settings: EpisodeSettings,
    ) -> Self {
        Self {
            synthesizer,
            merger,
            uploader,
            settings,
        }
    }

    /// Narrate `text` with `voice` into `layout`.
    ///
    /// Text that is empty or only whitespace counts as no text: nothing is
    /// chunked or synthesized and the run fails before creating the chunk
    /// directory.
    ///
    /// Also fails on failed chunks unless partial assembly is
    /// allowed, and on any assembly error. The run report is written before
    /// assembly, so failed indices are on disk even when this returns `Err`.
    /// Upload failures are reported in the outcome, not as `Err`.
    pub async fn run<F>(
        &self,
        text: &str,
        voice: Voice,
        layout: &EpisodeLayout,
        on_progress: F,
    ) -> Result<EpisodeOutcome>
    where
        F: FnMut(&DispatchProgress),
    {
        let started_at = Utc::now();

        if text.trim().is_empty() {
            bail!("No text found. Nothing to synthesize.");
        }

        let total_chars = text.chars().count();
        let estimated_cost = estimate_cost(text, self.settings.cost_per_char);
        let chunks = chunk_text(text, self.settings.chunk_size);
        info!(
            "Chars: {}, Chunks: {}, Cost: ${:.4}",
            total_chars,
            chunks.len(),
            estimated_cost
        );

        tokio::fs::create_dir_all(&layout.chunks_dir)
            .await
            .with_context(|| format!("Failed to create {}", layout.chunks_dir.display()))?;
        info!("Output: {}", layout.chunks_dir.display());
        info!("Using voice: {}", voice);

        let worker = SynthesisWorker::new(
            Arc::clone(&self.synthesizer),
            voice,
            self.settings.instructions.clone(),
            &layout.chunks_dir,
        );
        let dispatcher = ParallelDispatcher::new(worker, self.settings.concurrency);
        info!(
            "Dispatching {} chunks, {} at a time",
            chunks.len(),
            dispatcher.concurrency()
        );
        let results = dispatcher.run(chunks, on_progress).await;

        let summary = DispatchSummary::from_results(&results);
        info!(
            "Finished chunk processing: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed_indices.len()
        );
        if !summary.is_complete() {
            warn!("Failed chunks: {:?}", summary.failed_indices);
        }

        let report = RunReport {
            source: layout.base_name.clone(),
            voice,
            chunk_size: self.settings.chunk_size,
            total_chars,
            estimated_cost,
            started_at,
            finished_at: Utc::now(),
            summary,
            chunks: results,
        };
        report.save(&layout.chunks_dir)?;

        let segments = audio::plan_segments(
            &layout.chunks_dir,
            &report.chunks,
            self.settings.allow_partial,
        )?;
        let output_bytes = audio::assemble(self.merger.as_ref(), &segments, &layout.output_path)
            .with_context(|| format!("Failed to assemble {}", layout.output_path.display()))?;
        info!(
            "Merged {} segments into {} ({} bytes)",
            segments.len(),
            layout.output_path.display(),
            output_bytes
        );

        let upload = match &self.uploader {
            None => UploadOutcome::Skipped,
            Some(uploader) => match uploader.upload(&layout.output_path, &layout.remote_key).await {
                Ok(()) => {
                    let url = uploader.url_for(&layout.remote_key);
                    info!("Uploaded {}", url);
                    UploadOutcome::Uploaded(url)
                }
                Err(e) => {
                    error!("Error uploading {}: {}", layout.remote_key, e);
                    UploadOutcome::Failed(e.to_string())
                }
            },
        };

        Ok(EpisodeOutcome {
            report,
            output_path: layout.output_path.clone(),
            output_bytes,
            upload,
        })
    }
}

//! Run bookkeeping: failure summary and the `run.json` report.

use crate::tts::Voice;
use crate::worker::ChunkResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Name of the report file written into each chunk directory.
pub const REPORT_FILE: &str = "run.json";

/// Counts and failed indices of a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Indices of failed chunks, ascending.
    pub failed_indices: Vec<usize>,
}

impl DispatchSummary {
    pub fn from_results(results: &[ChunkResult]) -> Self {
        let mut failed_indices: Vec<usize> = results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.index)
            .collect();
        failed_indices.sort_unstable();

        Self {
            total: results.len(),
            succeeded: results.len() - failed_indices.len(),
            failed_indices,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_indices.is_empty()
    }
}

/// Everything known about one episode run, persisted next to its chunk files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub source: String,
    pub voice: Voice,
    pub chunk_size: usize,
    pub total_chars: usize,
    pub estimated_cost: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: DispatchSummary,
    /// One entry per chunk, sorted by index.
    pub chunks: Vec<ChunkResult>,
}

impl RunReport {
    /// Write the report as `run.json` in `dir`, returning its path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(REPORT_FILE);
        let file = File::create(&path).context("Failed to create run report")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).context("Failed to write run report")?;
        Ok(path)
    }

    /// Load a previously written report from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(REPORT_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse run report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_results() -> Vec<ChunkResult> {
        vec![
            ChunkResult::failure(4, "HTTP 500", 3),
            ChunkResult::success(0, "00000.mp3", 10),
            ChunkResult::failure(2, "timeout", 7),
            ChunkResult::success(1, "00001.mp3", 12),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = DispatchSummary::from_results(&sample_results());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed_indices, vec![2, 4]);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_summary_all_succeeded() {
        let results = vec![ChunkResult::success(0, "00000.mp3", 1)];
        assert!(DispatchSummary::from_results(&results).is_complete());
    }

    #[test]
    fn test_report_save_and_load() {
        let dir = TempDir::new().unwrap();
        let results = sample_results();
        let report = RunReport {
            source: "attention".to_string(),
            voice: Voice::Fable,
            chunk_size: 4096,
            total_chars: 9000,
            estimated_cost: 0.135,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            summary: DispatchSummary::from_results(&results),
            chunks: results,
        };

        let path = report.save(dir.path()).unwrap();
        assert!(path.ends_with(REPORT_FILE));

        let loaded = RunReport::load(dir.path()).unwrap();
        assert_eq!(loaded.voice, Voice::Fable);
        assert_eq!(loaded.summary.failed_indices, vec![2, 4]);
        assert_eq!(loaded.chunks.len(), 4);
        assert_eq!(loaded.chunks[0].failure_reason(), Some("HTTP 500"));
    }
}

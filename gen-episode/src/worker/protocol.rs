//! Per-chunk outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of one chunk's synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChunkStatus {
    /// Audio was written to `audio_path`.
    Completed { audio_path: PathBuf },
    /// Synthesis or the file write failed.
    Failed { reason: String },
}

/// Result of synthesizing one chunk, tagged with the chunk's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Index of the chunk this result belongs to.
    pub index: usize,
    /// Completion status.
    #[serde(flatten)]
    pub status: ChunkStatus,
    /// Time spent on this chunk (milliseconds).
    pub duration_ms: u64,
    /// When the chunk finished.
    pub completed_at: DateTime<Utc>,
}

impl ChunkResult {
    /// Create a successful result.
    pub fn success(index: usize, audio_path: impl Into<PathBuf>, duration_ms: u64) -> Self {
        Self {
            index,
            status: ChunkStatus::Completed {
                audio_path: audio_path.into(),
            },
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    /// Create a failed result.
    pub fn failure(index: usize, reason: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            index,
            status: ChunkStatus::Failed {
                reason: reason.into(),
            },
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ChunkStatus::Completed { .. })
    }

    pub fn audio_path(&self) -> Option<&Path> {
        match &self.status {
            ChunkStatus::Completed { audio_path } => Some(audio_path),
            ChunkStatus::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ChunkStatus::Completed { .. } => None,
            ChunkStatus::Failed { reason } => Some(reason),
        }
    }
}

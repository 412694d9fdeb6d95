//! Upload of finished episodes to blob storage.

pub mod gcs;

#[cfg(test)]
pub mod mock;

pub use gcs::GcsUploader;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from an upload attempt. Never retried.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Storage error (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Storage backend trait.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `local` under `remote_key`.
    async fn upload(&self, local: &Path, remote_key: &str) -> Result<(), UploadError>;

    /// Human-readable location of `remote_key`.
    fn url_for(&self, remote_key: &str) -> String;
}

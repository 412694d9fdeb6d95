//! Recording uploader for tests.

use super::{UploadError, Uploader};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingUploader {
    fail: bool,
    uploads: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// An uploader whose every upload is rejected.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, local: &Path, remote_key: &str) -> Result<(), UploadError> {
        self.uploads
            .lock()
            .unwrap()
            .push((local.to_path_buf(), remote_key.to_string()));
        if self.fail {
            return Err(UploadError::Rejected {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(())
    }

    fn url_for(&self, remote_key: &str) -> String {
        format!("mock://{}", remote_key)
    }
}

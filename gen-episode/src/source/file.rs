//! Plain UTF-8 text files.

use super::{SourceError, TextSource};
use async_trait::async_trait;
use log::info;
use std::path::PathBuf;

pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TextSource for FileTextSource {
    async fn text(&self) -> Result<String, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Read {
                path: self.path.display().to_string(),
                source: e,
            })?;
        info!("Read {} characters from {}", text.chars().count(), self.path.display());
        Ok(text)
    }

    fn describe(&self) -> String {
        format!("text file {}", self.path.display())
    }
}

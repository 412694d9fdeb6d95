//! PDF page-range text extraction.

use super::{SourceError, TextSource};
use async_trait::async_trait;
use log::{info, warn};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Extracts text from a PDF, skipping pages at both ends (front matter,
/// references, appendices).
pub struct PdfTextSource {
    path: PathBuf,
    start_offset: u32,
    end_offset: u32,
}

impl PdfTextSource {
    pub fn new(path: impl Into<PathBuf>, start_offset: u32, end_offset: u32) -> Self {
        Self {
            path: path.into(),
            start_offset,
            end_offset,
        }
    }
}

/// 0-indexed pages kept after dropping `start` pages at the front and `end` at the back.
fn page_range(total: u32, start: u32, end: u32) -> Range<u32> {
    let stop = total.saturating_sub(end);
    start.min(stop)..stop
}

fn extract(path: &Path, start: u32, end: u32) -> Result<String, SourceError> {
    let pdf_error = |message: String| SourceError::Pdf {
        path: path.display().to_string(),
        message,
    };

    let doc = lopdf::Document::load(path).map_err(|e| pdf_error(e.to_string()))?;
    // lopdf numbers pages from 1
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let range = page_range(page_numbers.len() as u32, start, end);

    let mut text = String::new();
    for &page in &page_numbers[range.start as usize..range.end as usize] {
        match doc.extract_text(&[page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Skipping page {} of {}: {}", page, path.display(), e),
        }
    }

    info!(
        "Extracted {} characters from pages {}..{} of {}",
        text.chars().count(),
        range.start,
        range.end,
        path.display()
    );
    Ok(text)
}

#[async_trait]
impl TextSource for PdfTextSource {
    async fn text(&self) -> Result<String, SourceError> {
        let path = self.path.clone();
        let (start, end) = (self.start_offset, self.end_offset);

        tokio::task::spawn_blocking(move || extract(&path, start, end))
            .await
            .map_err(|e| SourceError::Pdf {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?
    }

    fn describe(&self) -> String {
        format!(
            "PDF {} (skipping {} leading, {} trailing pages)",
            self.path.display(),
            self.start_offset,
            self.end_offset
        )
    }
}

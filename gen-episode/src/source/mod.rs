//! Text sources: where the narration text comes from.

mod file;
mod pdf;
mod script;

pub use file::FileTextSource;
pub use pdf::PdfTextSource;
pub use script::{ScriptSettings, ScriptSource};

use async_trait::async_trait;
use llm_client::LlmError;
use thiserror::Error;

/// Errors while obtaining the document text.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from {path}: {message}")]
    Pdf { path: String, message: String },

    #[error("Script generation failed: {0}")]
    Script(#[from] LlmError),
}

/// Produces the full document text for one run.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn text(&self) -> Result<String, SourceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

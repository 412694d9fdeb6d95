//! Narration script generation: rewrites a document as a spoken podcast script.

use super::{SourceError, TextSource};
use async_trait::async_trait;
use llm_client::{LlmProvider, LlmRequest};
use log::info;
use std::sync::Arc;

/// System prompt that turns a paper into a plain-prose podcast script.
pub const SCRIPT_SYSTEM_PROMPT: &str = "\
You turn academic research papers (full text, possibly Markdown with equations) into \
engaging, digestible podcast scripts.

Structure:
- Intro: open with the big picture and why the paper matters.
- Body: the problem, the approach, the key equations, and the results.
  For each key equation, give it a short symbolic name instead of reading it out, \
define every symbol, break it into its basic operations, and explain in plain \
language how those parts combine.
- Conclusion: the main takeaways and future directions.

Tone: clear enough for a general listener while keeping the technical depth. Use \
analogies sparingly and only where they clarify. Keep precise terminology where it matters.

Scope: cover the core ideas and their supporting equations. Skip references, \
bibliographies and appendices. Mention related papers and resources when relevant.

Output: a ready-to-record script in plain spoken prose. Do not use Markdown, headers, \
bullets, bold, italics or citation blocks.";

/// Sampling options for script generation.
#[derive(Debug, Clone, Copy)]
pub struct ScriptSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 30000,
        }
    }
}

/// Wraps another source and replaces its text with a generated script.
pub struct ScriptSource {
    inner: Box<dyn TextSource>,
    provider: Arc<dyn LlmProvider>,
    settings: ScriptSettings,
}

impl ScriptSource {
    pub fn new(
        inner: Box<dyn TextSource>,
        provider: Arc<dyn LlmProvider>,
        settings: ScriptSettings,
    ) -> Self {
        Self {
            inner,
            provider,
            settings,
        }
    }
}

#[async_trait]
impl TextSource for ScriptSource {
    async fn text(&self) -> Result<String, SourceError> {
        let document = self.inner.text().await?;
        if document.trim().is_empty() {
            return Ok(String::new());
        }

        info!(
            "Generating narration script with {} ({} characters in)",
            self.provider.name(),
            document.chars().count()
        );

        let request = LlmRequest::new(document)
            .with_system_prompt(SCRIPT_SYSTEM_PROMPT)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let response = self.provider.complete(request).await?;

        if let Some(usage) = response.usage {
            info!(
                "Script generated by {}: {} input / {} output tokens",
                response.model, usage.input_tokens, usage.output_tokens
            );
        }

        Ok(response.content)
    }

    fn describe(&self) -> String {
        format!("narration script of {}", self.inner.describe())
    }
}

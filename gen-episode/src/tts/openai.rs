//! OpenAI speech backend.
//!
//! Direct HTTP implementation of the `/audio/speech` endpoint.

use super::{SpeechRequest, SpeechSynthesizer, SynthesisError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Default speech model.
pub const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";

/// Speech backend for the OpenAI API.
pub struct OpenAiSpeech {
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiSpeech {
    /// Create a new OpenAI speech backend.
    pub fn new(model: &str, api_key: String) -> Self {
        Self::with_base_url(model, api_key, OPENAI_API_URL)
    }

    /// Create a backend against a custom API base (proxies, compatible servers).
    pub fn with_base_url(model: &str, api_key: String, base_url: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    instructions: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn build_body<'a>(model: &'a str, request: &'a SpeechRequest<'_>) -> SpeechBody<'a> {
    SpeechBody {
        model,
        input: request.text,
        voice: request.voice.as_str(),
        instructions: request.instructions,
        response_format: "mp3",
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>, SynthesisError> {
        let body = build_body(&self.model, request);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: Some(status.as_u16()),
                message: api_error_message(&error_text),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(format!("Failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}

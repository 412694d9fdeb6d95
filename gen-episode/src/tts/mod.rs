//! TTS backend trait and types.

pub mod openai;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use openai::OpenAiSpeech;

/// Instruction sent with every chunk so the narration sounds spoken, not read.
pub const DEFAULT_INSTRUCTIONS: &str = "Speak in a conversational tone, like a podcast.";

/// Voices supported by the speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Fable,
    Nova,
    Onyx,
    Sage,
    Shimmer,
}

impl Voice {
    /// Every supported voice, in the service's documented order.
    pub const ALL: [Voice; 10] = [
        Voice::Alloy,
        Voice::Ash,
        Voice::Ballad,
        Voice::Coral,
        Voice::Echo,
        Voice::Fable,
        Voice::Nova,
        Voice::Onyx,
        Voice::Sage,
        Voice::Shimmer,
    ];

    /// Wire name of the voice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Ash => "ash",
            Voice::Ballad => "ballad",
            Voice::Coral => "coral",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Nova => "nova",
            Voice::Onyx => "onyx",
            Voice::Sage => "sage",
            Voice::Shimmer => "shimmer",
        }
    }

    /// Pick a voice uniformly at random (unseeded).
    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Voice::Alloy)
    }

    /// Resolve the run's voice: explicit choice first, then configured default, then random.
    pub fn select(explicit: Option<Voice>, configured: Option<Voice>) -> Self {
        explicit.or(configured).unwrap_or_else(Self::random)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single synthesis call.
#[derive(Debug, Clone)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    pub voice: Voice,
    pub instructions: &'a str,
}

/// Errors from a speech backend. Always scoped to one chunk.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error{}: {message}", .status.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    Api { status: Option<u16>, message: String },

    #[error("Service returned no audio")]
    EmptyAudio,

    #[error("Failed to write audio: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech backend trait - all TTS services implement this.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text and return the encoded audio bytes.
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>, SynthesisError>;

    /// Backend name for display.
    fn name(&self) -> &'static str;
}

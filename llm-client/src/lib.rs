//! Chat-completion client for the gen-episode workspace
//!
//! Provides one interface over chat-completion backends:
//! - OpenAI chat completions API (and compatible servers)
//! - A configurable mock for tests

pub mod error;
pub mod provider;
pub mod providers;

pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{MockProvider, OpenAiProvider};

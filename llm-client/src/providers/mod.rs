//! LLM provider implementations

pub mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use crate::error::{LlmError, Result};

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Read an API key from the environment, naming the provider in the error
pub fn api_key_from_env(env_var: &str, provider_name: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::MissingApiKey {
            provider: provider_name.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

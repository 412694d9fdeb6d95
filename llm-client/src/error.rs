use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not found for {provider}. Set the {env_var} environment variable.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", .status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Model returned an empty completion")]
    EmptyCompletion,
}

pub type Result<T> = std::result::Result<T, LlmError>;

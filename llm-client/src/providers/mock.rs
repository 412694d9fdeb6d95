//! Mock LLM provider for testing
//!
//! Returns a canned completion or a canned failure and records every request
//! it receives, so callers can assert on the prompts they send.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

enum Behavior {
    Succeed(String),
    Fail(fn() -> LlmError),
}

/// A mock provider with fixed behavior
pub struct MockProvider {
    behavior: Behavior,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Create a provider that always answers with `response`
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            behavior: Behavior::Succeed(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the error built by `error`
    pub fn always_fails(error: fn() -> LlmError) -> Self {
        Self {
            behavior: Behavior::Fail(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Get the most recent request, if any
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.behavior {
            Behavior::Succeed(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "mock-model".to_string(),
                usage: None,
            }),
            Behavior::Fail(error) => Err(error()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

//! OpenAI chat completions provider
//!
//! Works with any server implementing `/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Provider for the OpenAI chat completions API
pub struct OpenAiProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    /// Create a provider against the public OpenAI API
    pub fn new(model: &str, api_key: String) -> Self {
        Self::with_base_url(model, api_key, OPENAI_API_URL)
    }

    /// Create a provider against a compatible server
    pub fn with_base_url(model: &str, api_key: String, base_url: &str) -> Self {
        Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn build_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system",
                content: system.clone(),
            });
        }

        messages.push(Message {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn parse_completion(body: ChatCompletionResponse, model: &str) -> Result<LlmResponse> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyCompletion)?;

    Ok(LlmResponse {
        content,
        model: model.to_string(),
        usage: body.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(&request))
            .send()
            .await
            .map_err(|e| LlmError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error.message)
                .unwrap_or(error_text);

            return Err(match status.as_u16() {
                429 => LlmError::RateLimited { retry_after },
                503 => LlmError::ServerOverloaded { message },
                code => LlmError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| LlmError::ApiError {
            message: format!("Failed to parse response: {}", e),
            status_code: None,
        })?;

        parse_completion(body, &self.model)
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_includes_sampling_options() {
        let provider = OpenAiProvider::new("gpt-4.1-mini", "key".to_string());
        let request = LlmRequest::new("paper")
            .with_system_prompt("host")
            .with_temperature(0.7)
            .with_max_tokens(30000);

        let json = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4.1-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "host");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "paper");
        assert_eq!(json["max_tokens"], 30000);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_request_omits_unset_options() {
        let provider = OpenAiProvider::new("gpt-4.1-mini", "key".to_string());
        let json = serde_json::to_value(provider.build_request(&LlmRequest::new("hi"))).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_completion() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Welcome to the show."}}],
                "usage":{"prompt_tokens":10,"completion_tokens":4}}"#,
        )
        .unwrap();
        let response = parse_completion(body, "gpt-4.1-mini").unwrap();
        assert_eq!(response.content, "Welcome to the show.");
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 4
            })
        );
    }

    #[test]
    fn test_parse_empty_completion() {
        let body: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(
            parse_completion(body, "m"),
            Err(LlmError::EmptyCompletion)
        ));

        let body: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            parse_completion(body, "m"),
            Err(LlmError::EmptyCompletion)
        ));
    }
}

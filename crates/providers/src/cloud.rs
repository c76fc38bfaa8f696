//! A cloud completion backend speaking an OpenAI-compatible
//! `/chat/completions` endpoint. Covers OpenRouter, OpenAI, Anthropic
//! (via compatible proxy), and any self-hosted OpenAI-shaped server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wizard_core::{Backend, BackendError, CompletionRequest, CompletionResponse, Usage};

pub struct CloudBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CloudBackend {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("failed to build HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOwned,
}

#[derive(Deserialize)]
struct ChatMessageOwned {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[async_trait]
impl Backend for CloudBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(backend = %self.name, model = %request.model, "sending cloud completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(request.max_tokens as u64)
                } else {
                    BackendError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(backend = %self.name, status = status.as_u16(), body = %error_body, "cloud backend returned error");
            return Err(BackendError::RequestFailed(format!("{status}: {error_body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("failed to parse response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = parsed
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or(Usage {
                prompt_tokens: 0,
                completion_tokens: 0,
            });

        Ok(CompletionResponse {
            content,
            model: request.model,
            usage,
        })
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_backend_reports_itself_as_remote() {
        let backend = CloudBackend::new("openrouter", "https://openrouter.ai/api/v1", "sk-test", 30_000);
        assert_eq!(backend.name(), "openrouter");
        assert!(!backend.is_local());
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let backend = CloudBackend::new("openrouter", "https://openrouter.ai/api/v1/", "sk-test", 30_000);
        assert_eq!(backend.base_url, "https://openrouter.ai/api/v1");
    }
}

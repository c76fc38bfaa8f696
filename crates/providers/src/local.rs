//! The local completion backend: calls an on-device model service over
//! HTTP. The Wizard never runs inference in-process — "local" means
//! same-host, not same-process — so this speaks the same
//! OpenAI-compatible wire shape as [`crate::cloud::CloudBackend`] against
//! a loopback endpoint (e.g. an Ollama or llama.cpp server).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wizard_core::{Backend, BackendError, CompletionRequest, CompletionResponse, Usage};

pub struct LocalBackend {
    base_url: String,
    client: reqwest::Client,
}

impl LocalBackend {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn localhost(port: u16, timeout_ms: u64) -> Self {
        Self::new(format!("http://127.0.0.1:{port}/v1"), timeout_ms)
    }
}

#[derive(Serialize)]
struct LocalRequest<'a> {
    prompt: &'a str,
    system: Option<&'a str>,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct LocalResponse {
    content: String,
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BackendError> {
        let url = format!("{}/complete", self.base_url);
        let body = LocalRequest {
            prompt: &request.prompt,
            system: request.system_prompt.as_deref(),
            model: &request.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: request.stream,
        };

        debug!(model = %request.model, "sending local completion request");

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(request.max_tokens as u64)
            } else if e.is_connect() {
                BackendError::NotConfigured("local model service unreachable".into())
            } else {
                BackendError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!("{status}: {body}")));
        }

        let parsed: LocalResponse = response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("failed to parse response: {e}")))?;

        Ok(CompletionResponse {
            content: parsed.content,
            model: request.model,
            usage: Usage {
                prompt_tokens: parsed.prompt_tokens,
                completion_tokens: parsed.completion_tokens,
            },
        })
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_reports_itself_as_local() {
        let backend = LocalBackend::localhost(11434, 30_000);
        assert_eq!(backend.name(), "local");
        assert!(backend.is_local());
    }
}

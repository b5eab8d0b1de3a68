use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{RagError, Result};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const SYSTEM_PROMPT: &str = "You are a helpful study assistant. Answer questions based on the \
provided context from study materials and past papers.";

/// LLM adapter: a local Ollama runtime or a remote OpenAI-compatible API,
/// selected once at startup. One blocking call per answer, no retries; the
/// caller decides whether to try again.
pub struct Generator {
    client: Client,
    backend: LlmConfig,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

impl Generator {
    pub fn new(backend: LlmConfig) -> Self {
        Self { client: Client::new(), backend }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match &self.backend {
            LlmConfig::Local { url, model } => self.generate_local(url, model, prompt).await,
            LlmConfig::Remote { base_url, api_key, model } => {
                self.generate_remote(base_url, api_key, model, prompt).await
            }
        }
    }

    async fn generate_local(&self, url: &str, model: &str, prompt: &str) -> Result<String> {
        let payload = OllamaRequest {
            model,
            prompt,
            stream: false,
            options: OllamaOptions { temperature: 0.5, num_predict: 256, num_ctx: 2048 },
        };

        let response = self
            .client
            .post(format!("{url}/api/generate"))
            .timeout(GENERATION_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RagError::LocalModelUnavailable {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::GenerationFailed(format!(
                "local model '{model}' returned {status}: {body} (is the model pulled?)"
            )));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| RagError::GenerationFailed(format!("malformed runtime response: {e}")))?;
        Ok(parsed.response)
    }

    async fn generate_remote(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String> {
        let payload = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.7,
            max_tokens: 512,
        };

        let response = self
            .client
            .post(format!("{base_url}/chat/completions"))
            .timeout(GENERATION_TIMEOUT)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RagError::RemoteApiFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::RemoteApiFailure(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::RemoteApiFailure(format!("malformed API response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::RemoteApiFailure("API returned no choices".to_string()))
    }

    /// Best-effort reachability probe for the health endpoint.
    pub async fn health_check(&self) -> bool {
        let result = match &self.backend {
            LlmConfig::Local { url, .. } => {
                self.client.get(format!("{url}/api/tags")).timeout(HEALTH_TIMEOUT).send().await
            }
            LlmConfig::Remote { base_url, api_key, .. } => {
                self.client
                    .get(format!("{base_url}/models"))
                    .timeout(HEALTH_TIMEOUT)
                    .bearer_auth(api_key)
                    .send()
                    .await
            }
        };
        result.map(|r| r.status().is_success()).unwrap_or(false)
    }
}

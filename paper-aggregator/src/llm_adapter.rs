use crate::config::SummarizerConfig;
use crate::types::{AggregatorError, Result, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Trait for text-generation backends the summarizer can talk to
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Get the name of this LLM adapter
    fn adapter_name(&self) -> String;

    /// Run one prompt.
    ///
    /// Transport failures and non-2xx answers are errors. A well-formed answer
    /// without text comes back as `Completion { text: None, .. }`.
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: Option<String>,
    pub usage: TokenUsage,
}

/// DashScope (Qwen) text-generation endpoint
pub struct DashScopeAdapter {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationInput<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_tokens: u32,
    temperature: f64,
    result_format: &'static str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    output: Option<GenerationOutput>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    choices: Vec<GenerationChoice>,
}

#[derive(Deserialize)]
struct GenerationChoice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl DashScopeAdapter {
    pub fn new(config: &SummarizerConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmAdapter for DashScopeAdapter {
    fn adapter_name(&self) -> String {
        format!("DashScope ({})", self.model)
    }

    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let payload = GenerationRequest {
            model: &self.model,
            input: GenerationInput {
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            },
            parameters: GenerationParameters {
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                result_format: "message",
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("DashScope error body: {}", body);
            return Err(AggregatorError::Summarizer(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let result: GenerationResponse = response.json().await?;
        let text = result
            .output
            .and_then(|output| output.choices.into_iter().next())
            .and_then(|choice| choice.message)
            .map(|message| message.content.trim().to_string())
            .filter(|content| !content.is_empty());

        Ok(Completion {
            text,
            usage: result.usage.unwrap_or_default(),
        })
    }
}

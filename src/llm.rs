//! LLM client for annotation, analysis and translation
//!
//! Supports OpenAI and Claude (Anthropic) APIs.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};

/// A single system + user exchange
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-in, text-out model backend
pub trait Completion: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = GatewayResult<String>> + Send;
}

/// LLM client for making API requests
pub struct LlmClient {
    client: Client,
    config: Config,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageResponse,
}

#[derive(Deserialize)]
struct OpenAiMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

// Claude API types
#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if LLM integration is available
    pub fn is_available(&self) -> bool {
        self.config.is_llm_enabled()
    }

    pub fn provider(&self) -> &str {
        &self.config.llm.provider
    }

    /// Call OpenAI chat completions
    async fn call_openai(&self, request: CompletionRequest) -> GatewayResult<String> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or(GatewayError::NotConfigured)?;

        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let body = OpenAiRequest {
            model: self.config.get_model(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamTransport(format!(
                "OpenAI API error: {} - {}",
                status, body
            )));
        }

        let openai_response: OpenAiResponse = response.json().await?;
        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::UpstreamFormat("Empty response from OpenAI".to_string()))
    }

    /// Call Claude messages API
    async fn call_claude(&self, request: CompletionRequest) -> GatewayResult<String> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or(GatewayError::NotConfigured)?;

        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        let body = ClaudeRequest {
            model: self.config.get_model(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamTransport(format!(
                "Claude API error: {} - {}",
                status, body
            )));
        }

        let claude_response: ClaudeResponse = response.json().await?;
        claude_response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| GatewayError::UpstreamFormat("Empty response from Claude".to_string()))
    }
}

impl Completion for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> GatewayResult<String> {
        if !self.is_available() {
            return Err(GatewayError::NotConfigured);
        }

        let content = match self.config.llm.provider.as_str() {
            "openai" => self.call_openai(request).await?,
            "claude" => self.call_claude(request).await?,
            other => {
                return Err(GatewayError::UpstreamTransport(format!(
                    "Unknown LLM provider: {}",
                    other
                )))
            }
        };

        Ok(content.trim().to_string())
    }
}

/// Remove markdown code fences the model may wrap its answer in
pub fn strip_fences(response: &str) -> String {
    let mut out = response.trim().to_string();
    for fence in ["```json\n", "```json", "```\n", "```"] {
        out = out.replace(fence, "");
    }
    out.trim().to_string()
}

/// Parse a model reply as JSON, tolerating fences and surrounding chatter
pub fn parse_json_reply(response: &str) -> GatewayResult<Value> {
    let stripped = strip_fences(response);
    if let Ok(value) = serde_json::from_str(&stripped) {
        return Ok(value);
    }

    // Fall back to the outermost array or object in the text
    let start = stripped.find(['[', '{']);
    let end = stripped.rfind([']', '}']);
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            return Ok(serde_json::from_str(&stripped[start..=end])?);
        }
    }

    Err(GatewayError::UpstreamFormat(format!(
        "Could not extract JSON from response: {}",
        response
    )))
}

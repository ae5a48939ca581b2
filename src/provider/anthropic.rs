//! Anthropic API Provider
//!
//! Vendor B: the messages wire format. The system prompt is a dedicated
//! `system` field rather than a message; `max_tokens` is mandatory; usage
//! accounting arrives as `input_tokens`/`output_tokens`. There is no native
//! JSON mode, so structured requests lean entirely on an explicit
//! respond-as-JSON instruction plus the extractor.
//!
//! System-role messages appearing in the conversation history are folded into
//! the `system` field (the API rejects them in `messages`); relative order of
//! the remaining turns is preserved.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatProvider, JSON_INSTRUCTION, credential_present, structured_from_response};
use crate::config::GatewayConfig;
use crate::constants::anthropic;
use crate::types::error::{GatewayError, Result};
use crate::types::request::{ChatRequest, ChatResponse, Role, StructuredResponse, TokenUsage};

/// Anthropic API Provider with secure API key handling
pub struct AnthropicProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    /// Construct from gateway configuration. A missing credential leaves the
    /// provider unconfigured rather than failing construction.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::transport("anthropic", format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key: config.anthropic_api_key.clone().map(SecretString::from),
            api_base: config
                .anthropic_api_base
                .clone()
                .unwrap_or_else(|| anthropic::API_BASE.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, request: &ChatRequest) -> MessagesRequest {
        let mut system_parts: Vec<&str> = Vec::new();
        if let Some(prompt) = request.system_prompt.as_deref() {
            system_parts.push(prompt);
        }

        let mut messages = Vec::with_capacity(request.messages.len());
        for message in &request.messages {
            match message.role {
                Role::System => system_parts.push(&message.content),
                role => messages.push(WireMessage {
                    role: role.as_str().to_string(),
                    content: message.content.clone(),
                }),
            }
        }

        if request.wants_structured_output {
            system_parts.push(JSON_INSTRUCTION);
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        MessagesRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            system,
            messages,
            max_tokens: request.max_output_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn is_configured(&self) -> bool {
        credential_present(self.api_key.as_ref().map(|k| k.expose_secret()))
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(GatewayError::Config(
                "Anthropic API key not found. Set ANTHROPIC_API_KEY or provide one in config"
                    .to_string(),
            ));
        }
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(GatewayError::Config(
                "Anthropic API key not found".to_string(),
            ));
        };

        let body = self.build_request(request);
        let url = format!("{}/messages", self.api_base);
        debug!(model = %body.model, structured = request.wants_structured_output, "sending Anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", anthropic::API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::transport(self.name(), format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Anthropic API error status");
            return Err(GatewayError::transport_status(
                self.name(),
                status.as_u16(),
                text,
            ));
        }

        let raw: Value = response.json().await.map_err(|e| {
            GatewayError::transport(self.name(), format!("failed to read response body: {e}"))
        })?;
        let parsed: MessagesResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            GatewayError::transport(self.name(), format!("malformed response body: {e}"))
        })?;

        let content = join_text_blocks(&parsed.content);
        if content.is_empty() {
            return Err(GatewayError::transport(
                self.name(),
                "no text content in response",
            ));
        }

        let usage = parsed
            .usage
            .map(|u| TokenUsage::from_anthropic(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            finish_reason: parsed.stop_reason,
            model_used: Some(body.model),
            usage,
            raw,
        })
    }

    async fn send_structured(&self, request: &ChatRequest) -> Result<StructuredResponse> {
        let mut request = request.clone();
        request.wants_structured_output = true;
        let response = self.send(&request).await?;
        structured_from_response(self.name(), response)
    }
}

/// Concatenate the text blocks of a content array, ignoring non-text blocks
fn join_text_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

// Request/Response wire types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u32,
    output_tokens: u32,
}

// =============================================================================
// Tests
// =============================================================================

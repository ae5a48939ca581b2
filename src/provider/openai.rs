//! OpenAI API Provider
//!
//! Vendor A: the chat-completion wire format. The system prompt is prepended
//! as a leading `system` message; usage accounting arrives as
//! `prompt_tokens`/`completion_tokens`. Structured output uses the native
//! `response_format` JSON mode plus an explicit instruction.
//!
//! Note: Retry and fallback logic live outside the provider; each call here
//! is single-shot.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatProvider, JSON_INSTRUCTION, credential_present, structured_from_response};
use crate::config::GatewayConfig;
use crate::constants::openai;
use crate::types::error::{GatewayError, Result};
use crate::types::request::{ChatRequest, ChatResponse, StructuredResponse, TokenUsage};

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    /// Construct from gateway configuration. A missing credential is not an
    /// error here: the provider reports `is_configured() == false` and `send`
    /// fails with a `Config` error instead.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::transport("openai", format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key: config.openai_api_key.clone().map(SecretString::from),
            api_base: config
                .openai_api_base
                .clone()
                .unwrap_or_else(|| openai::API_BASE.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, request: &ChatRequest) -> ChatCompletionRequest {
        let mut system = request.system_prompt.clone();
        if request.wants_structured_output {
            // OpenAI's JSON mode requires the word "JSON" in the prompt
            system = Some(match system {
                Some(prompt) => format!("{prompt}\n\n{JSON_INSTRUCTION}"),
                None => JSON_INSTRUCTION.to_string(),
            });
        }

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = system {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: Some(request.max_output_tokens.unwrap_or(self.max_tokens)),
            response_format: request.wants_structured_output.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn is_configured(&self) -> bool {
        credential_present(self.api_key.as_ref().map(|k| k.expose_secret()))
    }

    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(GatewayError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY or provide one in config"
                    .to_string(),
            ));
        }
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(GatewayError::Config("OpenAI API key not found".to_string()));
        };

        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);
        debug!(model = %body.model, structured = request.wants_structured_output, "sending OpenAI request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::transport(self.name(), format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "OpenAI API error status");
            return Err(GatewayError::transport_status(
                self.name(),
                status.as_u16(),
                text,
            ));
        }

        let raw: Value = response.json().await.map_err(|e| {
            GatewayError::transport(self.name(), format!("failed to read response body: {e}"))
        })?;
        let parsed: ChatCompletionResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            GatewayError::transport(self.name(), format!("malformed response body: {e}"))
        })?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::transport(self.name(), "no choices in response"))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| GatewayError::transport(self.name(), "no content in response"))?;

        Ok(ChatResponse {
            content,
            finish_reason: choice.finish_reason,
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

// Request/Response wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::ChatMessage;
    use serde_json::json;

    fn provider_with_key(key: Option<&str>) -> OpenAiProvider {
        let config = GatewayConfig {
            openai_api_key: key.map(str::to_string),
            ..Default::default()
        };
        OpenAiProvider::new(&config).unwrap()
    }

    #[test]
    fn test_is_configured_policy() {
        assert!(provider_with_key(Some("sk-live")).is_configured());
        assert!(!provider_with_key(None).is_configured());
        assert!(!provider_with_key(Some("")).is_configured());
        assert!(!provider_with_key(Some("   ")).is_configured());
    }

    #[tokio::test]
    async fn test_send_without_key_is_config_error() {
        let provider = provider_with_key(None);
        let result = provider.send(&ChatRequest::user("hi")).await;
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_system_prompt_prepended_as_leading_message() {
        let provider = provider_with_key(Some("sk-test"));
        let request = ChatRequest::new(vec![
            ChatMessage::user("question"),
            ChatMessage::assistant("answer"),
            ChatMessage::user("follow-up"),
        ])
        .with_system_prompt("be terse");

        let body = provider.build_request(&request);
        assert_eq!(body.messages.len(), 4);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[0].content, "be terse");
        assert_eq!(body.messages[1].content, "question");
        assert_eq!(body.messages[3].content, "follow-up");
    }

    #[test]
    fn test_structured_request_sets_json_mode() {
        let provider = provider_with_key(Some("sk-test"));
        let request = ChatRequest::user("analyze").with_structured_output();

        let body = provider.build_request(&request);
        assert_eq!(
            body.response_format.as_ref().map(|f| f.format_type.as_str()),
            Some("json_object")
        );
        assert!(body.messages[0].content.contains("JSON"));
    }

    #[test]
    fn test_request_wire_format() {
        let provider = provider_with_key(Some("sk-test"));
        let request = ChatRequest::user("hi")
            .with_model("gpt-4o")
            .with_temperature(0.5)
            .with_max_output_tokens(128);

        let wire = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(
            wire,
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5,
                "max_tokens": 128
            })
        );
    }

    #[test]
    fn test_response_wire_format() {
        let raw = json!({
            "choices": [{
                "message": {"content": "{\"ok\":true}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50}
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"ok\":true}")
        );
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));

        let usage = parsed
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap();
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
    }

    #[test]
    fn test_defaults_fill_missing_request_fields() {
        let provider = provider_with_key(Some("sk-test"));
        let body = provider.build_request(&ChatRequest::user("hi"));

        assert_eq!(body.model, openai::DEFAULT_MODEL);
        assert_eq!(
            body.max_tokens,
            Some(crate::constants::request::DEFAULT_MAX_TOKENS)
        );
        assert!(body.response_format.is_none());
    }
}

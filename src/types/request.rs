//! Request/Response Data Model
//!
//! Vendor-neutral request and response shapes. Every provider normalizes its
//! wire format into these types; message order is conversation history and is
//! preserved end to end.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::types::Result;

// =============================================================================
// Request
// =============================================================================

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire-format string shared by both vendors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Vendor-neutral chat request
///
/// `model: None` means the provider's configured default. Providers that lack
/// native structured output translate `wants_structured_output` into an
/// explicit respond-as-JSON instruction.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub wants_structured_output: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Single user-turn request
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(content)])
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_structured_output(mut self) -> Self {
        self.wants_structured_output = true;
        self
    }
}

// =============================================================================
// Response
// =============================================================================

/// Token usage normalized across vendor accounting field names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage accounting
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Anthropic-style usage accounting
    pub fn from_anthropic(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Normalized provider response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text content
    pub content: String,
    /// Vendor stop/finish reason, verbatim
    pub finish_reason: Option<String>,
    /// Model that actually served the call
    pub model_used: Option<String>,
    /// Normalized token accounting
    pub usage: TokenUsage,
    /// Opaque vendor payload, kept for callers that need vendor extras
    pub raw: Value,
}

// =============================================================================
// Structured Response
// =============================================================================

/// A follow-up request a model may embed in structured output, asking the
/// caller to supply more context in a later turn. This layer only passes these
/// through; it never acts on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FollowUpRequest {
    File { path: String },
    Search { query: String },
}

/// Structured (JSON) model output plus any pass-through follow-up requests
#[derive(Debug, Clone)]
pub struct StructuredResponse {
    /// Extracted JSON value (the full object, follow-ups included)
    pub data: Value,
    /// Parsed copy of the model's `followUpRequests` field, if present and
    /// well-formed; order preserved
    pub follow_up_requests: Vec<FollowUpRequest>,
}

impl StructuredResponse {
    /// Wrap an extracted value, splitting out any `followUpRequests` field.
    ///
    /// A malformed follow-up list is ignored rather than failing the whole
    /// response; the raw field stays available in `data`.
    pub fn from_value(data: Value) -> Self {
        let follow_up_requests = data
            .get("followUpRequests")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        Self {
            data,
            follow_up_requests,
        }
    }

    /// Deserialize the extracted value into a caller-defined type
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_value(Role::System).unwrap(), json!("system"));
        assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
        assert_eq!(
            serde_json::to_value(Role::Assistant).unwrap(),
            json!("assistant")
        );
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::user("hello")
            .with_model("gpt-4o")
            .with_system_prompt("be terse")
            .with_max_output_tokens(256)
            .with_temperature(0.7)
            .with_structured_output();

        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
        assert_eq!(request.system_prompt.as_deref(), Some("be terse"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_output_tokens, Some(256));
        assert!(request.wants_structured_output);
    }

    #[test]
    fn test_message_order_preserved() {
        let request = ChatRequest::new(vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
        ]);

        let contents: Vec<&str> = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_usage_normalization() {
        assert_eq!(
            TokenUsage::from_openai(100, 50),
            TokenUsage::from_anthropic(100, 50)
        );
        assert_eq!(TokenUsage::from_openai(100, 50).total(), 150);
    }

    #[test]
    fn test_follow_up_requests_split() {
        let value = json!({
            "summary": "needs more context",
            "followUpRequests": [
                {"kind": "file", "path": "src/parser.rs"},
                {"kind": "search", "query": "fn tokenize"}
            ]
        });

        let structured = StructuredResponse::from_value(value);
        assert_eq!(
            structured.follow_up_requests,
            vec![
                FollowUpRequest::File {
                    path: "src/parser.rs".to_string()
                },
                FollowUpRequest::Search {
                    query: "fn tokenize".to_string()
                },
            ]
        );
        // The raw field stays in data untouched
        assert!(structured.data.get("followUpRequests").is_some());
    }

    #[test]
    fn test_follow_up_requests_absent_or_malformed() {
        let structured = StructuredResponse::from_value(json!({"summary": "done"}));
        assert!(structured.follow_up_requests.is_empty());

        let structured =
            StructuredResponse::from_value(json!({"followUpRequests": "not a list"}));
        assert!(structured.follow_up_requests.is_empty());
    }

    #[test]
    fn test_structured_deserialize() {
        #[derive(Deserialize)]
        struct Summary {
            score: u32,
        }

        let structured = StructuredResponse::from_value(json!({"score": 7}));
        let summary: Summary = structured.deserialize().unwrap();
        assert_eq!(summary.score, 7);
    }
}

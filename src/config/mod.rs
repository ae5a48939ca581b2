//! Gateway Configuration
//!
//! Settings consumed from the host tool: per-vendor API keys, request timeout,
//! default model, preferred provider, and rate-limit tuning. Durable config
//! files are owned by an external collaborator; this layer only deserializes
//! the shape and overlays environment credentials.
//!
//! API keys are handled securely - never serialized back out and redacted in
//! debug output. Providers convert them to `SecretString` internally.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{rate_limit, request};
use crate::types::{GatewayError, Result};

/// Root gateway configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Preferred provider: "openai" or "anthropic"
    pub provider: String,

    /// Default model (provider-specific; `None` uses the provider default)
    pub model: Option<String>,

    /// OpenAI API key. Never serialized to output for security.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Anthropic API key. Never serialized to output for security.
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,

    /// OpenAI API base override (for proxies/compatible endpoints)
    pub openai_api_base: Option<String>,

    /// Anthropic API base override
    pub anthropic_api_base: Option<String>,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature applied when a request does not specify one
    pub temperature: f32,

    /// Maximum tokens to generate when a request does not specify one
    pub max_tokens: u32,

    /// Sliding-window rate-limit tuning
    pub rate_limit: RateLimitConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            openai_api_key: None,
            anthropic_api_key: None,
            openai_api_base: None,
            anthropic_api_base: None,
            timeout_secs: request::DEFAULT_TIMEOUT_SECS,
            temperature: request::DEFAULT_TEMPERATURE,
            max_tokens: request::DEFAULT_MAX_TOKENS,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("openai_api_base", &self.openai_api_base)
            .field("anthropic_api_base", &self.anthropic_api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl GatewayConfig {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `GatewayError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GatewayError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(GatewayError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.window_ms == 0 || self.rate_limit.max_calls == 0 {
            return Err(GatewayError::Config(
                "rate_limit window and max_calls must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Overlay credentials from `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` for any
    /// key the config itself does not carry.
    pub fn from_env(self) -> Self {
        let openai = std::env::var("OPENAI_API_KEY").ok();
        let anthropic = std::env::var("ANTHROPIC_API_KEY").ok();
        self.overlay_keys(openai, anthropic)
    }

    fn overlay_keys(mut self, openai: Option<String>, anthropic: Option<String>) -> Self {
        if self.openai_api_key.is_none() {
            self.openai_api_key = openai;
        }
        if self.anthropic_api_key.is_none() {
            self.anthropic_api_key = anthropic;
        }
        self
    }
}

/// Sliding-window rate-limit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum permitted calls per vendor key within one window
    pub max_calls: usize,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: rate_limit::MAX_CALLS,
            window_ms: rate_limit::WINDOW_MS,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Unified Error Type System
//!
//! Centralized error taxonomy for the gateway.
//!
//! ## Error Kinds
//!
//! - **Config**: Missing/blank credential or invalid settings - fatal, never retried
//! - **Transport**: Network failure, non-2xx status, vendor-reported error -
//!   retryable under the blanket retry policy
//! - **Parse**: The network call succeeded but no usable JSON could be
//!   extracted from the model output - callers may degrade to plain text
//! - **RateLimited**: Local refusal from the rate limiter before any network
//!   attempt - callers must poll or skip, nothing is queued
//!
//! ## Design Principles
//!
//! - Single unified error type (GatewayError) for the whole layer
//! - The retry wrapper deliberately does NOT consult `is_retryable`; callers
//!   that must avoid retrying a fatal error pre-classify before wrapping
//! - No panic/unwrap - all errors are recoverable

use thiserror::Error;

/// Unified gateway error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing/blank credential or invalid configuration. Fatal - surfaces
    /// immediately, never retried.
    #[error("config error: {0}")]
    Config(String),

    /// Fallback sequencer was given an empty model list: nothing was attempted.
    #[error("no models to attempt: fallback list is empty")]
    NoModels,

    /// Network failure, non-2xx status, or vendor-reported error.
    #[error("{provider} transport error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transport {
        provider: String,
        /// HTTP status when the server responded at all
        status: Option<u16>,
        message: String,
    },

    /// The call succeeded but extraction found no usable JSON in the output.
    #[error("{provider} parse error: {message}")]
    Parse { provider: String, message: String },

    /// Local sliding-window refusal, issued before any network attempt.
    #[error("rate limit window exhausted for '{key}'")]
    RateLimited { key: String },

    /// Serialization plumbing failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a transport error without an HTTP status (connection-level failure)
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error carrying the HTTP status
    pub fn transport_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a parse error for the given provider
    pub fn parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the same call could plausibly succeed.
    ///
    /// Informational only: [`crate::retry::with_retry`] retries every failure
    /// regardless (a known limitation of the blanket policy), so callers that
    /// care must check this BEFORE entering the retry wrapper.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

// =============================================================================
// Tests
// =============================================================================

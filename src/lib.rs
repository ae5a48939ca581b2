//! LLM Gateway - Provider Orchestration and Resilience Layer
//!
//! Calls external LLM vendor APIs on behalf of a code-analysis tool and
//! tolerates unreliable transports, heterogeneous wire formats, and malformed
//! structured output from the models themselves.
//!
//! ## Core Features
//!
//! - **Provider Abstraction**: One [`ChatProvider`] variant per vendor, all
//!   normalized into a common response shape
//! - **Sliding-Window Rate Limiting**: Per-vendor call counters with atomic
//!   prune-and-append
//! - **Retry with Backoff**: Generic re-invocation wrapper with exponential
//!   delay and optional jitter
//! - **Model Fallback**: Drives a provider through an ordered model list until
//!   one call succeeds
//! - **JSON Extraction**: Escalating parse/repair strategies for free-text
//!   model output
//!
//! ## Quick Start
//!
//! ```ignore
//! use llm_gateway::{ChatRequest, GatewayConfig, ProviderFactory};
//!
//! let config = GatewayConfig::default().from_env();
//! let factory = ProviderFactory::new(config);
//! let provider = factory.get()?;
//! let response = provider.send(&ChatRequest::user("Summarize this diff")).await?;
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: Vendor implementations, factory, model-fallback sequencer
//! - [`extract`]: JSON extraction and repair for model output
//! - [`limiter`]: Per-key sliding-window rate limiter
//! - [`retry`]: Backoff policy and retry wrapper
//! - [`config`]: Gateway settings consumed from the host tool

pub mod config;
pub mod constants;
pub mod extract;
pub mod limiter;
pub mod provider;
pub mod retry;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{GatewayConfig, RateLimitConfig};

// Error Types
pub use types::error::{GatewayError, Result};

// Data Model
pub use types::request::{
    ChatMessage, ChatRequest, ChatResponse, FollowUpRequest, Role, StructuredResponse, TokenUsage,
};

// =============================================================================
// Component Re-exports
// =============================================================================

pub use extract::extract_json;
pub use limiter::RateLimiter;
pub use provider::{
    AnthropicProvider, ChatProvider, ModelFallback, OpenAiProvider, ProviderFactory,
    SharedProvider, create_provider,
};
pub use retry::{RetryPolicy, with_retry};

//! LLM Provider Abstraction
//!
//! Defines the [`ChatProvider`] trait implemented by one variant per vendor.
//! The set of vendors is closed and explicit; new vendors are added as new
//! variants behind this one contract, not by structural matching.
//!
//! ## Modules
//!
//! - `openai`: Chat-completion wire format (vendor A)
//! - `anthropic`: Messages wire format (vendor B)
//! - `fallback`: Model-fallback sequencer driving a provider through an
//!   ordered model list

mod anthropic;
mod fallback;
mod openai;

pub use anthropic::AnthropicProvider;
pub use fallback::ModelFallback;
pub use openai::OpenAiProvider;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::extract::extract_json;
use crate::types::error::{GatewayError, Result};
use crate::types::request::{ChatRequest, ChatResponse, StructuredResponse};

/// Instruction appended to structured-output requests. Vendors with native
/// JSON modes still carry it (OpenAI requires the word "JSON" in the prompt);
/// vendors without one rely on it entirely, plus the extractor.
pub(crate) const JSON_INSTRUCTION: &str =
    "Respond ONLY with valid JSON, no explanation and no markdown fences.";

/// Shared provider handle for concurrent use across call chains
pub type SharedProvider = Arc<dyn ChatProvider>;

// =============================================================================
// Provider Contract
// =============================================================================

/// Vendor-neutral LLM provider contract
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// True iff a non-blank credential is present. Whitespace-only keys count
    /// as unconfigured.
    fn is_configured(&self) -> bool;

    /// Provider identifier for logging and rate-limit keying
    fn name(&self) -> &str;

    /// Send a request, normalizing the vendor wire format into
    /// [`ChatResponse`]. Fails with `Config` when unconfigured and `Transport`
    /// for HTTP/vendor errors.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Send a request expecting structured output, funneling the textual
    /// result through the JSON extractor. Fails with `Parse` when extraction
    /// yields nothing.
    async fn send_structured(&self, request: &ChatRequest) -> Result<StructuredResponse>;
}

/// Shared tail of `send_structured`: extract JSON from the normalized
/// response, or surface a `Parse` failure. Distinct from `Transport` because
/// the network call already succeeded.
pub(crate) fn structured_from_response(
    provider: &str,
    response: ChatResponse,
) -> Result<StructuredResponse> {
    match extract_json(&response.content) {
        Some(data) => Ok(StructuredResponse::from_value(data)),
        None => Err(GatewayError::parse(
            provider,
            "no JSON object or array found in model output",
        )),
    }
}

/// Whether a credential string counts as configured (non-empty after trim)
pub(crate) fn credential_present(key: Option<&str>) -> bool {
    key.is_some_and(|k| !k.trim().is_empty())
}

// =============================================================================
// Provider Factory
// =============================================================================

/// Create a shared provider from configuration
pub fn create_provider(config: &GatewayConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
        other => Err(GatewayError::Config(format!(
            "unknown provider: {other}. Supported: openai, anthropic"
        ))),
    }
}

/// Resolves and caches the configured provider instance.
///
/// The first `get` constructs the provider named by the config; later calls
/// return the cached handle until `reset` invalidates it (e.g. after the host
/// tool reloads configuration).
pub struct ProviderFactory {
    config: GatewayConfig,
    cached: Mutex<Option<SharedProvider>>,
}

impl ProviderFactory {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    /// Active provider, constructing and caching it on first use
    pub fn get(&self) -> Result<SharedProvider> {
        let mut cached = self.lock_cache();
        if let Some(provider) = cached.as_ref() {
            return Ok(Arc::clone(provider));
        }

        debug!(provider = %self.config.provider, "constructing provider");
        let provider = create_provider(&self.config)?;
        *cached = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Drop the cached instance so the next `get` reconstructs it
    pub fn reset(&self) {
        *self.lock_cache() = None;
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Option<SharedProvider>> {
        // A poisoned cache only means another thread panicked mid-insert;
        // the Option inside is still usable.
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Model-Fallback Sequencer
//!
//! Drives one provider through an ordered list of model identifiers until a
//! call succeeds, holding every other request field fixed. Optionally composes
//! with the retry wrapper so each model gets its own backoff budget before the
//! sequencer moves on.
//!
//! Per-model failures are observable only through logging; the error returned
//! on exhaustion is the LAST model's error, unwrapped, so callers can still
//! match on it.

use tracing::{info, warn};

use super::SharedProvider;
use crate::retry::{RetryPolicy, with_retry};
use crate::types::error::{GatewayError, Result};
use crate::types::request::{ChatRequest, ChatResponse};

/// Fallback sequencer over an ordered model list
pub struct ModelFallback {
    provider: SharedProvider,
    retry_policy: Option<RetryPolicy>,
}

impl ModelFallback {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            retry_policy: None,
        }
    }

    /// Wrap each per-model call in the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Try each model in order, returning the first success.
    ///
    /// An empty list performs zero calls and yields the distinguished
    /// [`GatewayError::NoModels`] outcome.
    pub async fn send_with_fallback(
        &self,
        request: &ChatRequest,
        models: &[String],
    ) -> Result<ChatResponse> {
        if models.is_empty() {
            return Err(GatewayError::NoModels);
        }

        let mut last_error: Option<GatewayError> = None;

        for model in models {
            let mut attempt = request.clone();
            attempt.model = Some(model.clone());

            let result = match &self.retry_policy {
                Some(policy) => with_retry(policy, || self.provider.send(&attempt)).await,
                None => self.provider.send(&attempt).await,
            };

            match result {
                Ok(response) => {
                    info!(model = %model, provider = self.provider.name(), "fallback sequence succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "model failed, trying next");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::transport(self.provider.name(), "all models failed")))
    }
}

// =============================================================================
// Tests
// =============================================================================

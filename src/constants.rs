//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Rate limiter constants
pub mod rate_limit {
    /// Sliding-window length (milliseconds)
    pub const WINDOW_MS: u64 = 60_000;

    /// Maximum calls permitted per key within one window
    pub const MAX_CALLS: usize = 10;
}

/// Retry policy constants
pub mod retry {
    /// Default maximum retries (total attempts = retries + 1)
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Initial delay before the first retry (milliseconds)
    pub const INITIAL_DELAY_MS: u64 = 1_000;

    /// Backoff multiplier applied per attempt
    pub const BACKOFF_FACTOR: f64 = 2.0;
}

/// Request defaults shared by all providers
pub mod request {
    /// HTTP request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Maximum tokens to generate when the request does not specify one
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// Default sampling temperature (low: deterministic analysis output)
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
}

/// OpenAI provider constants
pub mod openai {
    /// Default API base URL
    pub const API_BASE: &str = "https://api.openai.com/v1";

    /// Default model
    pub const DEFAULT_MODEL: &str = "gpt-4o";
}

/// Anthropic provider constants
pub mod anthropic {
    /// Default API base URL
    pub const API_BASE: &str = "https://api.anthropic.com/v1";

    /// Default model
    pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

    /// Required `anthropic-version` header value
    pub const API_VERSION: &str = "2023-06-01";
}

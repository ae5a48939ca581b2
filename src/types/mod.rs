//! Core Types
//!
//! Request/response data model and the unified error type.

pub mod error;
pub mod request;

pub use error::{GatewayError, Result};
pub use request::{
    ChatMessage, ChatRequest, ChatResponse, FollowUpRequest, Role, StructuredResponse, TokenUsage,
};

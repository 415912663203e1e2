//! LLM client abstraction.
//!
//! This module provides a unified interface for chat-completion providers
//! (Anthropic, OpenAI, and optionally Google Gemini) so that every
//! component that needs a model call -- claim decomposition, fact
//! verification, bias/intimacy analysis, perception extraction, narrative
//! synthesis, reflection -- goes through the same trait, the same retry and
//! timeout handling, and the same cost tracking.
//!
//! ## Example
//!
//! ```rust,ignore
//! use insightweaver_core::llm::{AnthropicClient, ClientConfig, CompletionRequest, ChatMessage};
//!
//! let client = AnthropicClient::new(
//!     ClientConfig::new("your-api-key").with_default_model("claude-3-5-sonnet-20241022"),
//! );
//!
//! let request = CompletionRequest::new().with_message(ChatMessage::user("Hello"));
//! let response = client.complete(request).await?;
//! ```

mod client;
mod types;

pub use client::{
    AnthropicClient, ClientConfig, LLMClient, MultiProviderClient, OpenAIClient, TrackedClient,
};
#[cfg(feature = "gemini")]
pub use client::GoogleClient;
pub use types::{
    CacheControl, ChatMessage, ChatRole, CompletionRequest, CompletionResponse, CostTracker,
    EmbeddingRequest, EmbeddingResponse, ModelCosts, ModelSpec, ModelTier, Provider, StopReason,
    TokenUsage,
};

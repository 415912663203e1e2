//! Error types for insightweaver-core.

use thiserror::Error;

/// Result type alias using insightweaver-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during brief generation and trust verification.
#[derive(Error, Debug)]
pub enum Error {
    /// The LLM gateway could not be reached, or returned a non-success status.
    #[error("LLM unavailable ({provider}): {message}")]
    LLMUnavailable { provider: String, message: String },

    /// The LLM responded, but its content could not be decoded into the
    /// expected JSON shape.
    #[error("LLM response parse failure: {0}")]
    LLMParseFailure(String),

    /// A claim could not be matched to exactly one authoritative source.
    #[error("ambiguous source match for claim {claim_id}: {candidates} candidates")]
    SourceMatchAmbiguous { claim_id: String, candidates: usize },

    /// A web fetch completed, but the server returned a non-2xx status.
    #[error("fetch returned HTTP {status} for {url}")]
    FetchHttpError { url: String, status: u16 },

    /// A web fetch did not complete within the configured timeout.
    #[error("fetch timed out after {duration_ms}ms for {url}")]
    FetchTimeout { url: String, duration_ms: u64 },

    /// A web fetch failed below the HTTP layer (DNS, connection, TLS).
    #[error("fetch network error for {url}: {message}")]
    FetchNetwork { url: String, message: String },

    /// A structured document violated one of its required invariants, e.g.
    /// a synthesis response dropped a required top-level key.
    #[error("schema invariant violated: {0}")]
    SchemaInvariantViolation(String),

    /// A caller-supplied input (user profile, configuration) failed
    /// validation against its required shape.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Serialization/deserialization error not already covered above.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error (missing or invalid environment value).
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an LLM-unavailable error.
    pub fn llm_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LLMUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an LLM parse-failure error.
    pub fn llm_parse_failure(message: impl Into<String>) -> Self {
        Self::LLMParseFailure(message.into())
    }

    /// Create an ambiguous-source-match error.
    pub fn source_match_ambiguous(claim_id: impl Into<String>, candidates: usize) -> Self {
        Self::SourceMatchAmbiguous {
            claim_id: claim_id.into(),
            candidates,
        }
    }

    /// Create a fetch HTTP-status error.
    pub fn fetch_http(url: impl Into<String>, status: u16) -> Self {
        Self::FetchHttpError {
            url: url.into(),
            status,
        }
    }

    /// Create a fetch timeout error.
    pub fn fetch_timeout(url: impl Into<String>, duration_ms: u64) -> Self {
        Self::FetchTimeout {
            url: url.into(),
            duration_ms,
        }
    }

    /// Create a fetch network error.
    pub fn fetch_network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchNetwork {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a schema-invariant-violation error.
    pub fn schema_invariant(message: impl Into<String>) -> Self {
        Self::SchemaInvariantViolation(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

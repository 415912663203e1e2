//! # insightweaver-core
//!
//! Personalized intelligence-brief generation and AI response trust
//! verification, built on a single LLM gateway used as both analyst and
//! critic.
//!
//! ## Core components
//!
//! - **Trust verification**: claim decomposition, fact verification
//!   (with fetch-first discipline for time-sensitive claims), bias
//!   analysis, intimacy/tone detection, and a deterministic
//!   actionability rule engine (see [`trust`]).
//! - **Context curation and synthesis**: token-budgeted article
//!   selection, perception extraction, coverage anomaly detection, and
//!   structured-JSON narrative synthesis with a reflection/refinement
//!   loop (see [`context`], [`synthesis`], [`reflection`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use insightweaver_core::llm::{AnthropicClient, ClientConfig};
//! use insightweaver_core::trust::analyze_trust;
//!
//! let client = AnthropicClient::new(ClientConfig::new("your-api-key"));
//! let analysis = analyze_trust(
//!     std::sync::Arc::new(client),
//!     &reqwest::Client::new(),
//!     &Default::default(),
//!     "The response text to check.",
//!     std::time::Duration::from_secs(20),
//! )
//! .await;
//! ```

pub mod config;
pub mod context;
pub mod context_module;
pub mod error;
pub mod json_decode;
pub mod llm;
pub mod model;
pub mod perspective;
pub mod profile;
pub mod reflection;
pub mod source_registry;
pub mod synthesis;
pub mod token_budget;
pub mod trust;
pub mod web_fetch;

pub use config::AppConfig;
pub use context::{
    curate_for_narrative_synthesis, detect_anomalies, extract_perception, resolve_perspective,
    AnomalyDetectorConfig, CuratedContext, HistoricalEntry,
};
pub use context_module::{format_for_context, group_modules, ContextModule, GroupedModules, ModuleType};
pub use error::{Error, Result};
pub use json_decode::{decode, extract_json_object};
pub use llm::{
    AnthropicClient, ClientConfig, CompletionRequest, LLMClient, ModelSpec, MultiProviderClient,
    OpenAIClient, Provider, TrackedClient,
};
pub use model::{
    Actionability, AnalyzedResult, Anomaly, AnomalyReport, AnomalySeverity, Article,
    AuthoritativeSource, Assumption, BiasAnalysis, BottomLine, Claim, ClaimType, CitationEntry,
    CrossArticleConnection, EntityMention, EventSequence, FactVerification, FactsSummary,
    FramingIssue, ImpactLevel, IntimacyAnalysis, IntimacyCategory, IntimacyIssue, LoadedTerm,
    Omission, PerceptionBundle, Prediction, PredictionsScenarios, PriorityEvent, Severity,
    SourceFallback, SynthesisDocument, SynthesisMetadata, TemporalCheck, Tone, TrendsAndPatterns,
    Trend, TrustAnalysis, Verdict,
};
pub use perspective::{get_default_perspective, get_perspective, list_perspectives, render_framework, Perspective};
pub use profile::UserProfile;
pub use reflection::{evaluate_depth, refine, DepthDimension, ReflectionResult, ShallowArea};
pub use source_registry::SourceRegistry;
pub use synthesis::synthesize;
pub use token_budget::{estimate_tokens, TokenBudget, TokenMetadata};
pub use trust::{
    analyze_trust, query_with_trust_constraints, run_full_pipeline, PipelineResult,
    TRUST_ENHANCED_SYSTEM_PROMPT,
};

//! Trust verification: claim decomposition (C5), fact verification (C6),
//! bias analysis (C7), intimacy detection (C8), and the orchestrating
//! pipeline with its deterministic actionability rules (C9).

mod bias_analyzer;
mod claims;
mod fact_verifier;
mod intimacy_detector;
mod pipeline;

pub use bias_analyzer::analyze_bias;
pub use claims::extract_claims;
pub use fact_verifier::{is_time_sensitive, verify_claims, TIME_SENSITIVE_KEYWORDS};
pub use intimacy_detector::analyze_intimacy;
pub use pipeline::{
    analyze_trust, query_with_trust_constraints, run_full_pipeline, PipelineResult,
    TRUST_ENHANCED_SYSTEM_PROMPT,
};

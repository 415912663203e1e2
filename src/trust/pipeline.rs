//! Trust verification pipeline (C9): orchestrates claim decomposition,
//! fact verification, bias analysis, and intimacy detection into a
//! single `TrustAnalysis`, then applies a deterministic actionability
//! rule engine over the results.
//!
//! Facts, bias, and intimacy analysis run concurrently -- each is an
//! independent read of the same response text, so there is no reason to
//! serialize them the way a naive port of the pipeline might.
//!
//! This module also carries the two query-side operations §4.9 names
//! alongside `analyze_response`: `query_with_trust_constraints` (input
//! enhancement) and `run_full_pipeline`, which composes a fetch-first
//! enrichment step (§4.9.1) ahead of the query with the output
//! verification phase below.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::{
    Actionability, AnalyzedResult, BiasAnalysis, FactsSummary, IntimacyAnalysis, TrustAnalysis,
};
use crate::source_registry::SourceRegistry;
use crate::trust::{bias_analyzer, claims, fact_verifier, intimacy_detector};

/// Counteracts the base model's tendency toward engagement-maximizing
/// hedges, flattery, and false certainty, without suppressing genuine
/// analytical nuance. Injected as the system prompt for every query run
/// through [`query_with_trust_constraints`].
pub const TRUST_ENHANCED_SYSTEM_PROMPT: &str = "You are answering a question that will be \
    independently fact-checked. Prioritize accuracy over agreeableness: do not soften a claim \
    to seem more helpful, do not invent false confidence to sound authoritative, and do not \
    pad the answer with unearned enthusiasm or emotional language. State what you know, state \
    what you are uncertain about, and say so plainly when you do not know something.";

/// The full result of [`run_full_pipeline`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineResult {
    pub original_query: String,
    pub response: String,
    pub trust_enhanced: bool,
    pub used_fetch_first: bool,
    pub analysis: Option<TrustAnalysis>,
}

#[derive(Debug, Deserialize)]
struct TimeSensitivityAssessment {
    is_time_sensitive: bool,
    #[serde(default)]
    facts_needed: String,
    #[serde(default)]
    source_type: String,
    #[serde(default)]
    reasoning: String,
}

/// §4.9.1: ask the LLM whether `user_query` is time-sensitive (distinct
/// from C6's keyword-based [`fact_verifier::is_time_sensitive`], which
/// screens already-verified *claims*, not an unasked *query*). On parse
/// or call failure, conservatively treats the query as not time-sensitive
/// so a fetch-first outage never blocks the plain-query path.
async fn analyze_time_sensitivity(llm: &Arc<dyn LLMClient>, user_query: &str) -> TimeSensitivityAssessment {
    let request = CompletionRequest::new()
        .with_system(
            "Decide whether answering this query well requires current, real-world information \
             that could have changed since a knowledge cutoff (e.g. who currently holds an \
             office, the latest version of something, today's conditions) as opposed to a \
             stable, conceptual, or historical fact. Respond with JSON only: \
             {\"is_time_sensitive\": bool, \"facts_needed\": str, \"source_type\": str, \
             \"reasoning\": str}.",
        )
        .with_message(ChatMessage::user(user_query))
        .with_max_tokens(200)
        .with_temperature(0.0);

    match llm.complete(request).await {
        Ok(completion) => decode(&completion.content).unwrap_or(TimeSensitivityAssessment {
            is_time_sensitive: false,
            facts_needed: String::new(),
            source_type: String::new(),
            reasoning: "time-sensitivity response could not be parsed".to_string(),
        }),
        Err(_) => TimeSensitivityAssessment {
            is_time_sensitive: false,
            facts_needed: String::new(),
            source_type: String::new(),
            reasoning: "time-sensitivity check failed".to_string(),
        },
    }
}

/// §4.9.1: for a time-sensitive query, attempt to fetch current facts
/// from a matching authoritative source and prepend them to the query
/// context. Fetch failures degrade silently (the plain query still
/// runs) but `used_fetch_first` is still reported `true` so the caller
/// can skip the redundant post-hoc temporal check in `analyze_response`.
async fn fetch_first(
    llm: &Arc<dyn LLMClient>,
    http: &reqwest::Client,
    registry: &SourceRegistry,
    user_query: &str,
    fetch_timeout: Duration,
) -> (String, bool) {
    let assessment = analyze_time_sensitivity(llm, user_query).await;
    if !assessment.is_time_sensitive {
        return (user_query.to_string(), false);
    }

    let source_match = registry.best_match(user_query, user_query).ok().flatten();
    let Some((source, _fallback)) = source_match else {
        return (user_query.to_string(), true);
    };

    let url = match registry.resolve_url(source, user_query, llm.clone()).await {
        Ok(url) => url,
        Err(_) => return (user_query.to_string(), true),
    };

    match crate::web_fetch::answer_from_page(http, llm.clone(), &url, &source.query_prompt, fetch_timeout).await {
        Ok(facts) => (
            format!(
                "Relevant current facts (retrieved from {}): {facts}\n\nQuestion: {user_query}",
                source.name
            ),
            true,
        ),
        Err(_) => (user_query.to_string(), true),
    }
}

/// §4.9 phase 1 (input enhancement): query the model with the
/// trust-enhanced system prompt.
pub async fn query_with_trust_constraints(
    llm: Arc<dyn LLMClient>,
    user_query: &str,
    temperature: f64,
) -> crate::error::Result<String> {
    let request = CompletionRequest::new()
        .with_system(TRUST_ENHANCED_SYSTEM_PROMPT)
        .with_message(ChatMessage::user(user_query))
        .with_temperature(temperature);

    let completion = llm.complete(request).await?;
    Ok(completion.content)
}

/// §4.9: composes fetch-first enrichment, the trust-enhanced query, and
/// (when `verify_response` is set) the output verification phase into a
/// single run.
#[allow(clippy::too_many_arguments)]
pub async fn run_full_pipeline(
    llm: Arc<dyn LLMClient>,
    http: &reqwest::Client,
    registry: &SourceRegistry,
    user_query: &str,
    verify_response: bool,
    temperature: f64,
    fetch_timeout: Duration,
) -> crate::error::Result<PipelineResult> {
    let (enriched_query, used_fetch_first) =
        fetch_first(&llm, http, registry, user_query, fetch_timeout).await;

    let response = query_with_trust_constraints(llm.clone(), &enriched_query, temperature).await?;

    let analysis = if verify_response {
        Some(analyze_trust(llm, http, registry, &response, fetch_timeout).await)
    } else {
        None
    };

    Ok(PipelineResult {
        original_query: user_query.to_string(),
        response,
        trust_enhanced: true,
        used_fetch_first,
        analysis,
    })
}

/// Run the full trust verification pipeline over `response_text`.
pub async fn analyze_trust(
    llm: Arc<dyn LLMClient>,
    http: &reqwest::Client,
    registry: &SourceRegistry,
    response_text: &str,
    fetch_timeout: Duration,
) -> TrustAnalysis {
    let response_length = response_text.chars().count();

    let claims_result = claims::extract_claims(llm.clone(), response_text).await;
    let claims_extracted_ok = claims_result.is_ok();
    let (claims_for_facts, claims_error_message) = match claims_result {
        Ok(claims) => (Some(claims), None),
        Err(e) => (None, Some(format!("claim extraction failed: {e}"))),
    };

    let facts_future = {
        let llm = llm.clone();
        async move {
            match claims_for_facts {
                Some(claims) => {
                    match fact_verifier::verify_claims(llm, http, registry, &claims, fetch_timeout)
                        .await
                    {
                        Ok(verifications) => AnalyzedResult::ok(FactsSummary { verifications }),
                        Err(e) => AnalyzedResult::failed(e.to_string()),
                    }
                }
                None => AnalyzedResult::failed(claims_error_message.unwrap_or_default()),
            }
        }
    };

    let bias_future = {
        let llm = llm.clone();
        async move {
            match bias_analyzer::analyze_bias(llm, response_text).await {
                Ok(bias) => AnalyzedResult::ok(bias),
                Err(e) => AnalyzedResult::<BiasAnalysis>::failed(e.to_string()),
            }
        }
    };

    let intimacy_future = {
        let llm = llm.clone();
        async move {
            match intimacy_detector::analyze_intimacy(llm, response_text).await {
                Ok(intimacy) => AnalyzedResult::ok(intimacy),
                Err(e) => AnalyzedResult::<IntimacyAnalysis>::failed(e.to_string()),
            }
        }
    };

    let (facts, bias, intimacy) = futures::join!(facts_future, bias_future, intimacy_future);

    let (actionability, actionability_reason) = rate_actionability(&facts.data, &bias.data, &intimacy.data);

    TrustAnalysis {
        analyzed: claims_extracted_ok,
        response_length,
        facts,
        bias,
        intimacy,
        actionability,
        actionability_reason,
    }
}

/// §4.9.2: deterministic, first-match-wins actionability rules.
fn rate_actionability(
    facts: &FactsSummary,
    bias: &BiasAnalysis,
    intimacy: &IntimacyAnalysis,
) -> (Actionability, String) {
    let contradicted_count = facts.contradicted_count();
    let high_severity_intimacy = intimacy.high_severity_count();
    let fact_score = facts.fact_score();
    let high_severity_bias = bias.high_severity_count();

    if contradicted_count > 0 {
        return (
            Actionability::No,
            format!("{contradicted_count} claim(s) were contradicted by verification"),
        );
    }
    if high_severity_intimacy > 0 {
        return (
            Actionability::No,
            format!("{high_severity_intimacy} high-severity intimacy issue(s) detected"),
        );
    }
    if fact_score < 0.6 {
        return (
            Actionability::Caution,
            format!("fact verification score {fact_score:.2} is below the 0.6 threshold"),
        );
    }
    if high_severity_bias >= 2 {
        return (
            Actionability::Caution,
            format!("{high_severity_bias} high-severity bias issue(s) detected"),
        );
    }
    if fact_score >= 0.8 && high_severity_bias == 0 {
        return (
            Actionability::Yes,
            "facts verified with high confidence and no high-severity bias".to_string(),
        );
    }

    (
        Actionability::Caution,
        "mixed signals: neither clearly trustworthy nor clearly problematic".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Claim, ClaimType, FactVerification, Verdict};

    fn verification(verdict: Verdict) -> FactVerification {
        FactVerification {
            claim: Claim {
                text: "x".to_string(),
                claim_type: ClaimType::Fact,
                confidence: 1.0,
                reasoning: String::new(),
            },
            verdict,
            confidence: 1.0,
            reasoning: String::new(),
            caveats: vec![],
            contradictions: vec![],
            temporal_check: None,
        }
    }

    #[test]
    fn contradicted_claim_forces_no_regardless_of_other_signals() {
        let facts = FactsSummary {
            verifications: vec![verification(Verdict::Contradicted), verification(Verdict::Verified)],
        };
        let (rating, _) = rate_actionability(&facts, &BiasAnalysis::default(), &IntimacyAnalysis::default());
        assert_eq!(rating, Actionability::No);
    }

    #[test]
    fn high_fact_score_and_no_bias_yields_yes() {
        let facts = FactsSummary {
            verifications: vec![verification(Verdict::Verified), verification(Verdict::Verified)],
        };
        let (rating, _) = rate_actionability(&facts, &BiasAnalysis::default(), &IntimacyAnalysis::default());
        assert_eq!(rating, Actionability::Yes);
    }

    #[test]
    fn low_fact_score_yields_caution() {
        let facts = FactsSummary {
            verifications: vec![verification(Verdict::Unverifiable), verification(Verdict::Verified)],
        };
        let (rating, _) = rate_actionability(&facts, &BiasAnalysis::default(), &IntimacyAnalysis::default());
        assert_eq!(rating, Actionability::Caution);
    }

    use crate::llm::{EmbeddingRequest, EmbeddingResponse, ModelSpec, Provider};
    use chrono::Utc;

    /// Returns a fixed response body for every call, regardless of prompt.
    struct ScriptedClient(String);

    #[async_trait::async_trait]
    impl LLMClient for ScriptedClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<crate::llm::CompletionResponse, crate::error::Error> {
            Ok(crate::llm::CompletionResponse {
                id: "test".to_string(),
                model: "test".to_string(),
                content: self.0.clone(),
                stop_reason: None,
                usage: Default::default(),
                timestamp: Utc::now(),
                cost: None,
            })
        }

        async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, crate::error::Error> {
            unreachable!()
        }

        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        fn available_models(&self) -> Vec<ModelSpec> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn conceptual_query_is_not_time_sensitive() {
        let llm: Arc<dyn LLMClient> = Arc::new(ScriptedClient(
            r#"{"is_time_sensitive": false, "facts_needed": "", "source_type": "", "reasoning": "stable concept"}"#.to_string(),
        ));
        let assessment = analyze_time_sensitivity(&llm, "What is Python?").await;
        assert!(!assessment.is_time_sensitive);
    }

    #[tokio::test]
    async fn time_sensitive_query_without_matching_source_still_reports_fetch_first_used() {
        let llm: Arc<dyn LLMClient> = Arc::new(ScriptedClient(
            r#"{"is_time_sensitive": true, "facts_needed": "current officeholder", "source_type": "government", "reasoning": "asks who currently holds an office"}"#.to_string(),
        ));
        let registry = SourceRegistry::default();
        let http = reqwest::Client::new();
        let (query, used_fetch_first) = fetch_first(
            &llm,
            &http,
            &registry,
            "Who is the Prime Minister of India?",
            Duration::from_secs(5),
        )
        .await;
        assert!(used_fetch_first);
        assert_eq!(query, "Who is the Prime Minister of India?");
    }

    #[tokio::test]
    async fn malformed_time_sensitivity_response_degrades_to_not_time_sensitive() {
        let llm: Arc<dyn LLMClient> = Arc::new(ScriptedClient("not json at all".to_string()));
        let assessment = analyze_time_sensitivity(&llm, "anything").await;
        assert!(!assessment.is_time_sensitive);
    }

    #[tokio::test]
    async fn query_with_trust_constraints_uses_the_trust_enhanced_system_prompt() {
        let llm: Arc<dyn LLMClient> = Arc::new(ScriptedClient("a plain answer".to_string()));
        let response = query_with_trust_constraints(llm, "Who created Python?", 1.0)
            .await
            .unwrap();
        assert_eq!(response, "a plain answer");
    }
}

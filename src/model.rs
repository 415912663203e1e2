//! Core data model shared across the trust-verification and synthesis
//! pipelines: articles, claims, verifications, bias/intimacy analysis,
//! the composite trust analysis, the authoritative source registry's
//! entry type, the synthesis document, and the perception/anomaly
//! bundles produced ahead of synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ingested, already-deduplicated article. Immutable within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub embedding_summary: Option<String>,
}

impl Article {
    /// Content used for prompts: prefer the embedding summary, then the
    /// raw content, matching `_format_articles`' fallback chain.
    pub fn display_content(&self) -> &str {
        self.embedding_summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.content)
    }
}

/// Epistemic status of one extracted claim (closed taxonomy, C5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Fact,
    Inference,
    Speculation,
    Opinion,
}

impl ClaimType {
    /// SPECULATION and OPINION claims are never sent to the verifier LLM.
    pub fn is_verifiable(&self) -> bool {
        matches!(self, ClaimType::Fact | ClaimType::Inference)
    }
}

impl std::fmt::Display for ClaimType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClaimType::Fact => "FACT",
            ClaimType::Inference => "INFERENCE",
            ClaimType::Speculation => "SPECULATION",
            ClaimType::Opinion => "OPINION",
        };
        write!(f, "{s}")
    }
}

/// One discrete assertion extracted from an AI response (C5 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    pub confidence: f64,
    pub reasoning: String,
}

/// Terminal verdict for one claim (closed taxonomy, C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Verified,
    Contradicted,
    Unverifiable,
    Outdated,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Verified => "VERIFIED",
            Verdict::Contradicted => "CONTRADICTED",
            Verdict::Unverifiable => "UNVERIFIABLE",
            Verdict::Outdated => "OUTDATED",
            Verdict::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// Secondary check that a VERIFIED, time-sensitive claim is still current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalCheck {
    pub still_current: Option<bool>,
    pub confidence: f64,
    pub reasoning: String,
    pub checked_date: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub update_info: Option<String>,
    pub method: String,
}

/// Result of verifying one claim (C6 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactVerification {
    pub claim: Claim,
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub caveats: Vec<String>,
    #[serde(default)]
    pub contradictions: Vec<String>,
    #[serde(default)]
    pub temporal_check: Option<TemporalCheck>,
}

/// A claim presented with a slanted frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramingIssue {
    pub frame_type: String,
    pub text: String,
    pub effect: String,
    pub alternative: String,
}

/// An unstated premise the response relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumption {
    pub assumption: String,
    pub basis: String,
    pub impact: String,
}

/// A perspective or fact the response leaves out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Omission {
    pub missing_perspective: String,
    pub relevance: String,
    pub suggestion: String,
}

/// A word or phrase carrying unwarranted emotional weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedTerm {
    pub term: String,
    pub connotation: String,
    pub neutral_alternative: String,
}

/// Output of the bias analyzer (C7): four disjoint issue lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiasAnalysis {
    #[serde(default)]
    pub framing_issues: Vec<FramingIssue>,
    #[serde(default)]
    pub assumptions: Vec<Assumption>,
    #[serde(default)]
    pub omissions: Vec<Omission>,
    #[serde(default)]
    pub loaded_terms: Vec<LoadedTerm>,
}

impl BiasAnalysis {
    /// §4.9.2 `high_severity_bias`: framing issues, plus assumptions whose
    /// impact is described as significant/major/critical/strong, plus
    /// omissions whose relevance is described as critical/essential/
    /// important/key.
    pub fn high_severity_count(&self) -> usize {
        const ASSUMPTION_KEYWORDS: [&str; 4] = ["significant", "major", "critical", "strong"];
        const OMISSION_KEYWORDS: [&str; 4] = ["critical", "essential", "important", "key"];

        let severe_assumptions = self
            .assumptions
            .iter()
            .filter(|a| {
                let impact = a.impact.to_lowercase();
                ASSUMPTION_KEYWORDS.iter().any(|kw| impact.contains(kw))
            })
            .count();

        let severe_omissions = self
            .omissions
            .iter()
            .filter(|o| {
                let relevance = o.relevance.to_lowercase();
                OMISSION_KEYWORDS.iter().any(|kw| relevance.contains(kw))
            })
            .count();

        self.framing_issues.len() + severe_assumptions + severe_omissions
    }
}

/// Category of an intimacy/tone issue (closed taxonomy, C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntimacyCategory {
    Emotion,
    FalseEmpathy,
    Anthropomorphization,
    Familiarity,
}

/// Severity of a single intimacy issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Holistic tone classification of a response (closed taxonomy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tone {
    Professional,
    Familiar,
    Inappropriate,
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Professional
    }
}

/// One instance of overly intimate or anthropomorphizing language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntimacyIssue {
    pub category: IntimacyCategory,
    pub text: String,
    pub explanation: String,
    pub severity: Severity,
    pub professional_alternative: String,
}

/// Output of the intimacy detector (C8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntimacyAnalysis {
    #[serde(default)]
    pub issues: Vec<IntimacyIssue>,
    #[serde(default)]
    pub overall_tone: Tone,
    #[serde(default)]
    pub summary: String,
}

impl IntimacyAnalysis {
    /// §4.9.2: count of HIGH-severity issues, precomputed for the
    /// actionability rule engine.
    pub fn high_severity_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::High)
            .count()
    }
}

/// Terminal trust verdict computed by deterministic rules (C9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Actionability {
    Yes,
    No,
    Caution,
}

/// A sub-analysis that carries its own success marker so partial
/// pipeline failures remain visible to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedResult<T> {
    pub analyzed: bool,
    pub data: T,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T: Default> AnalyzedResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            analyzed: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            analyzed: false,
            data: T::default(),
            error: Some(error.into()),
        }
    }
}

/// Facts sub-block of a trust analysis: the verifications plus derived
/// counts used by the actionability rule engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactsSummary {
    pub verifications: Vec<FactVerification>,
}

impl FactsSummary {
    pub fn total_claims(&self) -> usize {
        self.verifications.len()
    }

    pub fn verified_count(&self) -> usize {
        self.verifications
            .iter()
            .filter(|v| v.verdict == Verdict::Verified)
            .count()
    }

    pub fn contradicted_count(&self) -> usize {
        self.verifications
            .iter()
            .filter(|v| v.verdict == Verdict::Contradicted)
            .count()
    }

    /// Claims that were actually put to the verifier LLM (FACT/INFERENCE).
    /// SPECULATION/OPINION claims get an automatic UNVERIFIABLE verdict
    /// (§4.6 step 1) and would otherwise silently drag down the score of
    /// a response that made no unverifiable factual claims at all.
    fn verifiable_claims_count(&self) -> usize {
        self.verifications
            .iter()
            .filter(|v| v.claim.claim_type.is_verifiable())
            .count()
    }

    /// §9 Open Question: OUTDATED facts are not counted as verified.
    /// The denominator is the claims actually subject to verification,
    /// not the full claim count -- see scenario 1 in `SPEC_FULL.md` §8,
    /// where a single verified FACT alongside an OPINION still scores 1.0.
    pub fn fact_score(&self) -> f64 {
        self.verified_count() as f64 / (self.verifiable_claims_count().max(1) as f64)
    }
}

/// Composite output of the trust pipeline (C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustAnalysis {
    pub analyzed: bool,
    pub response_length: usize,
    pub facts: AnalyzedResult<FactsSummary>,
    pub bias: AnalyzedResult<BiasAnalysis>,
    pub intimacy: AnalyzedResult<IntimacyAnalysis>,
    pub actionability: Actionability,
    pub actionability_reason: String,
}

/// One curated web resource in the authoritative source registry (C3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritativeSource {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_template: Option<String>,
    #[serde(default)]
    pub requires_country_extraction: bool,
    pub query_prompt: String,
}

impl AuthoritativeSource {
    /// Exactly one of `url`/`url_template` must be set (§3 invariant).
    pub fn is_well_formed(&self) -> bool {
        self.url.is_some() != self.url_template.is_some()
    }
}

/// Descriptor attached to a result when no source matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFallback {
    pub enabled: bool,
    pub reason: String,
}

impl Default for SourceFallback {
    fn default() -> Self {
        Self {
            enabled: false,
            reason: "no authoritative source registered for this claim".to_string(),
        }
    }
}

/// Impact level of a priority event (closed taxonomy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpactLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// Executive summary plus any immediately actionable items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BottomLine {
    pub summary: String,
    #[serde(default)]
    pub immediate_actions: Vec<String>,
}

/// One measurable trend within a geographic scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trend {
    pub subject: String,
    pub direction: String,
    pub quantifier: String,
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub article_citations: Vec<u32>,
}

/// `trends_and_patterns`: five fixed geographic scopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendsAndPatterns {
    #[serde(default)]
    pub local: Vec<Trend>,
    #[serde(default)]
    pub state_regional: Vec<Trend>,
    #[serde(default)]
    pub national: Vec<Trend>,
    #[serde(default)]
    pub global: Vec<Trend>,
    #[serde(default)]
    pub niche_field: Vec<Trend>,
}

/// An upcoming, dated event worth flagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityEvent {
    pub event: String,
    pub when: String,
    pub impact_level: ImpactLevel,
    pub why_matters: String,
    pub recommended_action: String,
    pub confidence: f64,
    #[serde(default)]
    pub article_citations: Vec<u32>,
}

/// One projected near-term development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f64,
    pub timeframe: String,
    pub rationale: String,
    #[serde(default)]
    pub article_citations: Vec<u32>,
}

/// `predictions_scenarios`: five fixed categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionsScenarios {
    #[serde(default)]
    pub local_governance: Vec<Prediction>,
    #[serde(default)]
    pub education: Vec<Prediction>,
    #[serde(default)]
    pub niche_field: Vec<Prediction>,
    #[serde(default)]
    pub economic_conditions: Vec<Prediction>,
    #[serde(default)]
    pub infrastructure: Vec<Prediction>,
}

/// A single citation target referenced via a `^[n]` marker in synthesis text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationEntry {
    pub title: String,
    pub source: String,
    pub url: String,
}

/// Synthesis metadata: provenance of a generated brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisMetadata {
    pub articles_analyzed: usize,
    pub generated_at: DateTime<Utc>,
    pub synthesis_id: String,
    #[serde(default)]
    pub citation_map: HashMap<String, CitationEntry>,
}

/// Strict-schema output of the narrative synthesizer (C14/C15).
///
/// The set of top-level keys is exactly `{bottom_line, trends_and_patterns,
/// priority_events, predictions_scenarios, metadata}` -- refinement may
/// only ever change values, never this shape (§4.15, §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisDocument {
    pub bottom_line: BottomLine,
    pub trends_and_patterns: TrendsAndPatterns,
    pub priority_events: Vec<PriorityEvent>,
    pub predictions_scenarios: PredictionsScenarios,
    pub metadata: SynthesisMetadata,
}

/// An entity mentioned across two or more articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub article_ids: Vec<u32>,
    pub contexts: Vec<String>,
}

/// A theme connecting three or more articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossArticleConnection {
    pub theme: String,
    pub article_ids: Vec<u32>,
    pub connection: String,
}

/// A temporal progression spanning several articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSequence {
    pub sequence: String,
    pub article_ids: Vec<u32>,
    pub timeframe: String,
}

/// Cross-article patterns pre-extracted ahead of synthesis (C11).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerceptionBundle {
    #[serde(default)]
    pub entity_mentions: Vec<EntityMention>,
    #[serde(default)]
    pub cross_article_connections: Vec<CrossArticleConnection>,
    #[serde(default)]
    pub event_sequences: Vec<EventSequence>,
}

/// Severity of a detected coverage anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

/// A single detected deviation from baseline coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub anomaly_type: String,
    pub severity: AnomalySeverity,
    pub description: String,
}

/// Output of the coverage anomaly detector (C12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub has_baseline: bool,
    #[serde(default)]
    pub baseline_period: String,
    #[serde(default)]
    pub current_period: String,
    #[serde(default)]
    pub current_article_count: usize,
    #[serde(default)]
    pub baseline_article_count: usize,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub summary: String,
}

impl AnomalyReport {
    pub fn no_baseline() -> Self {
        Self {
            has_baseline: false,
            baseline_period: String::new(),
            current_period: String::new(),
            current_article_count: 0,
            baseline_article_count: 0,
            anomalies: Vec::new(),
            summary: "insufficient historical data for anomaly detection".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn claim_type_verifiability() {
        assert!(ClaimType::Fact.is_verifiable());
        assert!(ClaimType::Inference.is_verifiable());
        assert!(!ClaimType::Speculation.is_verifiable());
        assert!(!ClaimType::Opinion.is_verifiable());
    }

    fn any_claim_type() -> impl Strategy<Value = ClaimType> {
        prop_oneof![
            Just(ClaimType::Fact),
            Just(ClaimType::Inference),
            Just(ClaimType::Speculation),
            Just(ClaimType::Opinion),
        ]
    }

    proptest! {
        /// Every member of the closed `ClaimType` taxonomy round-trips
        /// through JSON unchanged, including the `SCREAMING_SNAKE_CASE`
        /// rename -- a claim's type is never ambiguous across the wire.
        #[test]
        fn claim_type_json_round_trips(claim_type in any_claim_type()) {
            let json = serde_json::to_string(&claim_type).unwrap();
            let decoded: ClaimType = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(decoded, claim_type);
        }

        /// Same property for `Verdict`, the five-member closed taxonomy
        /// C6 produces.
        #[test]
        fn verdict_json_round_trips(verdict in prop_oneof![
            Just(Verdict::Verified),
            Just(Verdict::Contradicted),
            Just(Verdict::Unverifiable),
            Just(Verdict::Outdated),
            Just(Verdict::Error),
        ]) {
            let json = serde_json::to_string(&verdict).unwrap();
            let decoded: Verdict = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(decoded, verdict);
        }
    }

    #[test]
    fn closed_taxonomy_round_trips_through_json() {
        for verdict in [
            Verdict::Verified,
            Verdict::Contradicted,
            Verdict::Unverifiable,
            Verdict::Outdated,
            Verdict::Error,
        ] {
            let json = serde_json::to_string(&verdict).unwrap();
            let back: Verdict = serde_json::from_str(&json).unwrap();
            assert_eq!(verdict, back);
        }
    }

    #[test]
    fn fact_score_treats_outdated_as_unverified() {
        let mut summary = FactsSummary::default();
        summary.verifications.push(FactVerification {
            claim: Claim {
                text: "The CEO is Jane Doe".to_string(),
                claim_type: ClaimType::Fact,
                confidence: 1.0,
                reasoning: String::new(),
            },
            verdict: Verdict::Outdated,
            confidence: 0.9,
            reasoning: String::new(),
            caveats: vec![],
            contradictions: vec![],
            temporal_check: None,
        });
        assert_eq!(summary.verified_count(), 0);
        assert_eq!(summary.fact_score(), 0.0);
    }

    #[test]
    fn fact_score_ignores_automatic_opinion_verdicts_in_its_denominator() {
        let mut summary = FactsSummary::default();
        summary.verifications.push(FactVerification {
            claim: Claim {
                text: "Guido van Rossum created Python".to_string(),
                claim_type: ClaimType::Fact,
                confidence: 0.95,
                reasoning: String::new(),
            },
            verdict: Verdict::Verified,
            confidence: 0.95,
            reasoning: String::new(),
            caveats: vec![],
            contradictions: vec![],
            temporal_check: None,
        });
        summary.verifications.push(FactVerification {
            claim: Claim {
                text: "Python is a beautiful language".to_string(),
                claim_type: ClaimType::Opinion,
                confidence: 0.9,
                reasoning: String::new(),
            },
            verdict: Verdict::Unverifiable,
            confidence: 1.0,
            reasoning: "OPINION cannot be factually verified".to_string(),
            caveats: vec![],
            contradictions: vec![],
            temporal_check: None,
        });
        assert_eq!(summary.total_claims(), 2);
        assert_eq!(summary.verified_count(), 1);
        assert_eq!(summary.fact_score(), 1.0);
    }

    #[test]
    fn high_severity_bias_counts_framing_plus_qualified_assumptions_and_omissions() {
        let bias = BiasAnalysis {
            framing_issues: vec![FramingIssue {
                frame_type: "loaded".to_string(),
                text: "x".to_string(),
                effect: "y".to_string(),
                alternative: "z".to_string(),
            }],
            assumptions: vec![
                Assumption {
                    assumption: "a".to_string(),
                    basis: "b".to_string(),
                    impact: "This is a significant assumption".to_string(),
                },
                Assumption {
                    assumption: "a2".to_string(),
                    basis: "b2".to_string(),
                    impact: "Minor impact".to_string(),
                },
            ],
            omissions: vec![Omission {
                missing_perspective: "m".to_string(),
                relevance: "This is a critical omission".to_string(),
                suggestion: "s".to_string(),
            }],
            loaded_terms: vec![],
        };
        assert_eq!(bias.high_severity_count(), 3);
    }

    #[test]
    fn source_well_formedness_requires_exactly_one_of_url_or_template() {
        let mut source = AuthoritativeSource {
            name: "Example".to_string(),
            keywords: vec!["example".to_string()],
            url: Some("https://example.com".to_string()),
            url_template: None,
            requires_country_extraction: false,
            query_prompt: "who leads example".to_string(),
        };
        assert!(source.is_well_formed());
        source.url_template = Some("https://example.com/{country}".to_string());
        assert!(!source.is_well_formed());
    }
}

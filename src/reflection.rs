//! Reflection and refinement (C15): scores a synthesis document's depth
//! across five dimensions and, when shallow, asks the model to refine it
//! while preserving the document's exact structure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::SynthesisDocument;

const DEFAULT_DEPTH_THRESHOLD: f64 = 8.0;

/// One dimension the reflection engine scores the synthesis on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthDimension {
    CausalDepth,
    HistoricalAwareness,
    CrossArticleSynthesis,
    PredictionSpecificity,
    ImplicationExploration,
}

/// A dimension the evaluator judged shallow, with guidance for refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShallowArea {
    pub dimension: DepthDimension,
    pub score: f64,
    pub guidance: String,
}

/// Result of evaluating a synthesis document's analytical depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResult {
    pub depth_score: f64,
    #[serde(default)]
    pub shallow_areas: Vec<ShallowArea>,
    #[serde(default)]
    pub fallback: bool,
}

impl ReflectionResult {
    fn fallback_passing() -> Self {
        Self {
            depth_score: DEFAULT_DEPTH_THRESHOLD,
            shallow_areas: Vec::new(),
            fallback: true,
        }
    }

    pub fn needs_refinement(&self, threshold: f64) -> bool {
        self.depth_score < threshold || !self.shallow_areas.is_empty()
    }
}

const EVAL_SYSTEM_PROMPT: &str = "You evaluate the analytical depth of an intelligence synthesis \
    document across five dimensions, each scored 0-10: causal_depth (does it explain why, not \
    just what), historical_awareness (does it connect to prior context), cross_article_synthesis \
    (does it draw connections across articles rather than summarizing each alone), \
    prediction_specificity (are predictions concrete and falsifiable), and \
    implication_exploration (does it explore second-order consequences). Respond with JSON only: \
    {\"depth_score\": number 0-10 (the average across dimensions), \"shallow_areas\": \
    [{\"dimension\": \"causal_depth\"|\"historical_awareness\"|\"cross_article_synthesis\"|\
    \"prediction_specificity\"|\"implication_exploration\", \"score\": number 0-10, \"guidance\": \
    str}]}. Only include a dimension in shallow_areas if its score is below 7.";

/// Evaluate `synthesis`'s depth via a single LLM call at `temperature =
/// 0.3`. On any LLM or parse failure, falls back to a passing score
/// rather than blocking the pipeline on a reflection-layer outage.
pub async fn evaluate_depth(
    llm: Arc<dyn LLMClient>,
    synthesis: &SynthesisDocument,
) -> ReflectionResult {
    let rendered = match serde_json::to_string_pretty(synthesis) {
        Ok(json) => json,
        Err(_) => return ReflectionResult::fallback_passing(),
    };

    let request = CompletionRequest::new()
        .with_system(EVAL_SYSTEM_PROMPT)
        .with_message(ChatMessage::user(rendered))
        .with_max_tokens(2000)
        .with_temperature(0.3);

    match llm.complete(request).await {
        Ok(completion) => decode(&completion.content).unwrap_or_else(|_| ReflectionResult::fallback_passing()),
        Err(_) => ReflectionResult::fallback_passing(),
    }
}

fn build_refinement_prompt(
    synthesis: &SynthesisDocument,
    synthesis_json: &str,
    evaluation: &ReflectionResult,
) -> String {
    let shallow_summary = evaluation
        .shallow_areas
        .iter()
        .map(|a| format!("- {:?} ({:.1}/10): {}", a.dimension, a.score, a.guidance))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Here is the synthesis to refine, first as readable text, then as the exact JSON you must \
         return a refined version of:\n\n\
         Bottom line: {}\n\n\
         Original JSON (preserve this exact structure):\n{synthesis_json}\n\n\
         Evaluation found these shallow areas:\n{shallow_summary}\n\n\
         Refine the document to address the shallow areas above. You MUST preserve the JSON \
         structure exactly: the same five top-level keys (bottom_line, trends_and_patterns, \
         priority_events, predictions_scenarios, metadata), the same nested field names within \
         each, and the same geographic/category subkeys. Do not add, remove, or rename any field. \
         Only change the substance of the analysis.",
        synthesis.bottom_line.summary,
    )
}

/// Ask the model to refine `synthesis` based on `evaluation`'s feedback.
/// If the refined document's structure doesn't match the original's
/// (verified via round-trip deserialization into the same type), the
/// refinement is discarded and the original is kept.
pub async fn refine(
    llm: Arc<dyn LLMClient>,
    synthesis: SynthesisDocument,
    evaluation: &ReflectionResult,
) -> Result<SynthesisDocument> {
    let synthesis_json = serde_json::to_string_pretty(&synthesis)?;
    let prompt = build_refinement_prompt(&synthesis, &synthesis_json, evaluation);

    let request = CompletionRequest::new()
        .with_system(
            "You refine an intelligence synthesis document to deepen its analysis while \
             preserving its exact JSON structure. Respond with the complete refined JSON only.",
        )
        .with_message(ChatMessage::user(prompt))
        .with_max_tokens(8000)
        .with_temperature(0.4);

    let completion = llm.complete(request).await?;

    match decode::<SynthesisDocument>(&completion.content) {
        Ok(refined) => Ok(refined),
        Err(_) => Ok(synthesis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_refinement_below_threshold() {
        let result = ReflectionResult {
            depth_score: 6.0,
            shallow_areas: vec![],
            fallback: false,
        };
        assert!(result.needs_refinement(DEFAULT_DEPTH_THRESHOLD));
    }

    #[test]
    fn passing_score_with_no_shallow_areas_needs_no_refinement() {
        let result = ReflectionResult {
            depth_score: 9.0,
            shallow_areas: vec![],
            fallback: false,
        };
        assert!(!result.needs_refinement(DEFAULT_DEPTH_THRESHOLD));
    }

    #[test]
    fn fallback_result_is_a_passing_score() {
        let result = ReflectionResult::fallback_passing();
        assert!(result.fallback);
        assert_eq!(result.depth_score, DEFAULT_DEPTH_THRESHOLD);
        assert!(!result.needs_refinement(DEFAULT_DEPTH_THRESHOLD));
    }
}

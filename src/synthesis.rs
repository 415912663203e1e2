//! Narrative synthesis (C14): turns a curated context into a strict
//! five-key `SynthesisDocument` via a single structured-JSON LLM call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::context::CuratedContext;
use crate::error::{Error, Result};
use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::{AnomalyReport, CitationEntry, PerceptionBundle, SynthesisDocument};

/// Resolve every `^[n]` marker appearing anywhere in `text` against the
/// curated context's article list (`[n]`-numbered in `articles_block`,
/// §4.14). Markers with no corresponding article index are skipped --
/// a hallucinated citation number shouldn't poison the whole map.
fn build_citation_map(text: &str, context: &CuratedContext) -> HashMap<String, CitationEntry> {
    let marker = Regex::new(r"\^\[(\d+)\]").expect("static citation marker pattern is valid");
    let mut map = HashMap::new();
    for capture in marker.captures_iter(text) {
        let n: usize = match capture[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if let Some(article) = context.articles.get(n) {
            map.entry(n.to_string()).or_insert_with(|| CitationEntry {
                title: article.title.clone(),
                source: article.source_name.clone(),
                url: article.url.clone(),
            });
        }
    }
    map
}

const SYSTEM_PROMPT: &str = "You are a synthesis engine producing a structured intelligence \
    brief from curated articles and context. Respond with JSON only, matching exactly this \
    shape, with no additional top-level keys: {\"bottom_line\": {\"summary\": str, \
    \"immediate_actions\": [str]}, \"trends_and_patterns\": {\"local\": [trend], \
    \"state_regional\": [trend], \"national\": [trend], \"global\": [trend], \"niche_field\": \
    [trend]}, \"priority_events\": [event], \"predictions_scenarios\": {\"local_governance\": \
    [prediction], \"education\": [prediction], \"niche_field\": [prediction], \
    \"economic_conditions\": [prediction], \"infrastructure\": [prediction]}}, where trend = \
    {\"subject\": str, \"direction\": str, \"quantifier\": str, \"description\": str, \
    \"confidence\": number 0-1, \"article_citations\": [int]}, event = {\"event\": str, \"when\": \
    str, \"impact_level\": \"CRITICAL\"|\"HIGH\"|\"MEDIUM\"|\"LOW\", \"why_matters\": str, \
    \"recommended_action\": str, \"confidence\": number 0-1, \"article_citations\": [int]}, and \
    prediction = {\"prediction\": str, \"confidence\": number 0-1, \"timeframe\": str, \
    \"rationale\": str, \"article_citations\": [int]}. Do not include a metadata key -- it is \
    attached by the caller.";

#[derive(serde::Deserialize)]
struct SynthesisBody {
    bottom_line: crate::model::BottomLine,
    trends_and_patterns: crate::model::TrendsAndPatterns,
    priority_events: Vec<crate::model::PriorityEvent>,
    predictions_scenarios: crate::model::PredictionsScenarios,
}

/// §4.11: render the pre-extracted cross-article patterns as a short
/// Markdown block for injection into the synthesis context. An empty
/// bundle renders to a one-line placeholder rather than three empty
/// headings.
fn format_perception(perception: &PerceptionBundle) -> String {
    if perception.entity_mentions.is_empty()
        && perception.cross_article_connections.is_empty()
        && perception.event_sequences.is_empty()
    {
        return "No cross-article patterns detected.".to_string();
    }

    let mut block = String::new();
    if !perception.entity_mentions.is_empty() {
        block.push_str("Entities:\n");
        for mention in &perception.entity_mentions {
            block.push_str(&format!(
                "- {} ({}), mentioned in articles {:?}\n",
                mention.entity, mention.entity_type, mention.article_ids
            ));
        }
    }
    if !perception.cross_article_connections.is_empty() {
        block.push_str("Cross-article connections:\n");
        for connection in &perception.cross_article_connections {
            block.push_str(&format!(
                "- {}: {} (articles {:?})\n",
                connection.theme, connection.connection, connection.article_ids
            ));
        }
    }
    if !perception.event_sequences.is_empty() {
        block.push_str("Event sequences:\n");
        for sequence in &perception.event_sequences {
            block.push_str(&format!(
                "- {} ({}), articles {:?}\n",
                sequence.sequence, sequence.timeframe, sequence.article_ids
            ));
        }
    }
    block.trim_end().to_string()
}

/// §4.12: render the coverage anomaly report as a short Markdown block.
fn format_anomalies(report: &AnomalyReport) -> String {
    if !report.has_baseline {
        return "No historical baseline available for anomaly comparison.".to_string();
    }
    if report.anomalies.is_empty() {
        return format!(
            "Baseline ({} vs {}): {}",
            report.current_period, report.baseline_period, report.summary
        );
    }

    let mut block = format!(
        "Baseline ({} vs {}): {}\n",
        report.current_period, report.baseline_period, report.summary
    );
    for anomaly in &report.anomalies {
        block.push_str(&format!(
            "- [{:?}] {}: {}\n",
            anomaly.severity, anomaly.anomaly_type, anomaly.description
        ));
    }
    block.trim_end().to_string()
}

fn render_context(context: &CuratedContext) -> String {
    format!(
        "Instructions:\n{}\n\nUser profile:\n{}\n\nDecision context:\n{}\n\nDomain knowledge:\n{}\n\n\
         Cross-article patterns:\n{}\n\nCoverage anomalies:\n{}\n\nHistorical memory:\n{}\n\nArticles:\n{}",
        context.instructions,
        context.user_profile_block,
        context.decision_context_block,
        context.domain_knowledge_block,
        format_perception(&context.perception),
        format_anomalies(&context.anomaly_analysis),
        context.historical_block,
        context.articles_block,
    )
}

/// Produce a synthesis document from a curated context via one LLM call.
pub async fn synthesize(
    llm: Arc<dyn LLMClient>,
    context: &CuratedContext,
    articles_analyzed: usize,
) -> Result<SynthesisDocument> {
    let request = CompletionRequest::new()
        .with_system(SYSTEM_PROMPT)
        .with_message(ChatMessage::user(render_context(context)))
        .with_max_tokens(8000)
        .with_temperature(0.4);

    let completion = llm.complete(request).await?;
    let citation_map = build_citation_map(&completion.content, context);
    let body: SynthesisBody = decode(&completion.content)?;

    Ok(SynthesisDocument {
        bottom_line: body.bottom_line,
        trends_and_patterns: body.trends_and_patterns,
        priority_events: body.priority_events,
        predictions_scenarios: body.predictions_scenarios,
        metadata: crate::model::SynthesisMetadata {
            articles_analyzed,
            generated_at: Utc::now(),
            synthesis_id: Uuid::new_v4().to_string(),
            citation_map,
        },
    })
}

/// Validate that a candidate document preserves the five required
/// top-level keys against a reference document's shape. Used by the
/// reflection engine to reject a refinement that silently dropped or
/// renamed a section.
pub fn validate_schema_shape(_reference: &SynthesisDocument, _candidate: &SynthesisDocument) -> Result<()> {
    // Both sides are already typed as `SynthesisDocument`, so successful
    // deserialization of the candidate is itself proof the five
    // required keys survived. This function exists as the named seam
    // the reflection engine calls, in case future schema versions need
    // a looser, JSON-Value-based comparison here instead.
    Ok(())
}

pub fn schema_invariant_error(message: impl Into<String>) -> Error {
    Error::schema_invariant(message)
}

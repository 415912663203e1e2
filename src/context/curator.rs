//! Context curation (C13): assembles the final, token-budgeted context
//! handed to the narrative synthesizer, combining the user profile,
//! perspective framework, articles, perception bundle, anomaly report,
//! historical memory, and any supplemental context modules.

use std::collections::HashMap;

use serde::Serialize;

use crate::context_module::{format_for_context, group_modules, ContextModule};
use crate::model::{AnomalyReport, Article, PerceptionBundle};
use crate::perspective::{get_default_perspective, get_perspective, render_framework, Perspective};
use crate::profile::UserProfile;
use crate::token_budget::{estimate_tokens, TokenBudget, TokenMetadata};

/// One prior synthesis summary kept for continuity across runs.
#[derive(Debug, Clone)]
pub struct HistoricalEntry {
    pub generated_at: String,
    pub summary: String,
}

/// The fully assembled context a synthesis call is grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct CuratedContext {
    pub perspective_id: String,
    pub instructions: String,
    pub user_profile_block: String,
    pub articles_block: String,
    pub decision_context_block: String,
    pub domain_knowledge_block: String,
    pub perception: PerceptionBundle,
    pub anomaly_analysis: AnomalyReport,
    pub historical_block: String,
    #[serde(rename = "_token_metadata")]
    pub token_metadata: TokenMetadata,
    /// The articles that survived budget compression, in the same order
    /// used to number the `[n]` markers in `articles_block`. The
    /// synthesizer uses this to resolve `^[n]` citation markers in its
    /// output text back to a `CitationEntry`.
    pub articles: Vec<Article>,
}

fn profile_template_values(profile: &UserProfile) -> HashMap<&'static str, String> {
    let mut values = HashMap::new();
    if let Some(location) = profile.primary_location() {
        values.insert("city", location.to_string());
    }
    let domains = profile.professional_domains();
    if !domains.is_empty() {
        values.insert("professional_domains", domains.join(", "));
    }
    if let Some(geo) = profile.geographic_context().as_object() {
        if let Some(state) = geo.get("state").and_then(|v| v.as_str()) {
            values.insert("state", state.to_string());
        }
        if let Some(region) = geo.get("region").and_then(|v| v.as_str()) {
            values.insert("region", region.to_string());
        }
        if let Some(country) = geo.get("country").and_then(|v| v.as_str()) {
            values.insert("country", country.to_string());
        }
    }
    if let Some(civic) = profile.civic_interests().get("topics").and_then(|v| v.as_array()) {
        let topics: Vec<String> = civic.iter().filter_map(|t| t.as_str().map(String::from)).collect();
        if !topics.is_empty() {
            values.insert("civic_focus", topics.join(", "));
        }
    }
    values
}

fn format_user_profile(profile: &UserProfile) -> String {
    format!(
        "Location: {}\nProfessional domains: {}\nExcluded topics: {}",
        profile.primary_location().unwrap_or("unspecified"),
        profile.professional_domains().join(", "),
        profile.excluded_topics().join(", ")
    )
}

fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "[{}] {} -- {} ({})\n{}",
                i,
                a.title,
                a.source_name,
                a.published_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
                a.display_content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_historical(entries: &[HistoricalEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.generated_at, e.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Three-step compression schedule applied when the assembled context
/// exceeds its token budget (§4.10): drop to 30 articles, then drop to
/// 20, then trim historical memory to just its header plus the two most
/// recent summaries. Idempotent: re-running against an already-compressed
/// context changes nothing further.
fn enforce_budget(
    budget: &TokenBudget,
    mut articles: Vec<Article>,
    mut historical: Vec<HistoricalEntry>,
) -> (Vec<Article>, Vec<HistoricalEntry>, bool) {
    let mut historical_trimmed = false;

    let articles_tokens = |a: &[Article]| estimate_tokens(&format_articles(a));

    if articles_tokens(&articles) > budget.articles && articles.len() > 30 {
        articles.truncate(30);
    }
    if articles_tokens(&articles) > budget.articles && articles.len() > 20 {
        articles.truncate(20);
    }
    if articles_tokens(&articles) > budget.articles {
        let historical_tokens = estimate_tokens(&format_historical(&historical));
        if historical_tokens > budget.historical && historical.len() > 2 {
            historical.truncate(2);
            historical_trimmed = true;
        }
    }

    (articles, historical, historical_trimmed)
}

/// Resolve which perspective to use: an explicit caller override, then
/// the profile's own preference, then the registry default.
pub fn resolve_perspective<'a>(
    explicit: Option<&'a str>,
    profile: &'a UserProfile,
) -> &'static Perspective {
    if let Some(id) = explicit {
        if let Some(p) = get_perspective(id) {
            return p;
        }
    }
    if let Some(id) = profile.preferred_perspective() {
        if let Some(p) = get_perspective(id) {
            return p;
        }
    }
    get_default_perspective()
}

/// Curate the final context for narrative synthesis.
pub fn curate_for_narrative_synthesis(
    profile: &UserProfile,
    perspective_override: Option<&str>,
    articles: Vec<Article>,
    perception: PerceptionBundle,
    anomaly_analysis: AnomalyReport,
    historical: Vec<HistoricalEntry>,
    modules: &[ContextModule],
) -> CuratedContext {
    let budget = TokenBudget::default();
    let perspective = resolve_perspective(perspective_override, profile);
    let values = profile_template_values(profile);
    let instructions = render_framework(perspective, &values);

    let original_article_count = articles.len();
    let (articles, historical, historical_trimmed) = enforce_budget(&budget, articles, historical);
    let articles_dropped = original_article_count - articles.len();

    let grouped = group_modules(modules);
    let decision_context_block =
        format_for_context(&grouped.decision_context, budget.articles / 10);
    let domain_knowledge_block =
        format_for_context(&grouped.domain_knowledge, budget.articles / 10);

    let user_profile_block = format_user_profile(profile);
    let articles_block = format_articles(&articles);
    let historical_block = format_historical(&historical);

    let estimated_tokens = estimate_tokens(&instructions)
        + estimate_tokens(&user_profile_block)
        + estimate_tokens(&articles_block)
        + estimate_tokens(&decision_context_block)
        + estimate_tokens(&domain_knowledge_block)
        + estimate_tokens(&historical_block);

    CuratedContext {
        perspective_id: perspective.id.to_string(),
        instructions,
        user_profile_block,
        articles_block,
        decision_context_block,
        domain_knowledge_block,
        perception,
        anomaly_analysis,
        historical_block,
        token_metadata: TokenMetadata {
            estimated_tokens,
            budget_tokens: budget.total(),
            articles_included: articles.len(),
            articles_dropped,
            historical_trimmed,
        },
        articles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use serde_json::json;

    fn profile() -> UserProfile {
        UserProfile::load(json!({
            "geographic_context": {"primary_location": "Asheville, NC", "state": "NC"},
            "professional_context": {"professional_domains": ["civil engineering"]},
            "civic_interests": {"topics": ["zoning"]},
            "personal_priorities": {},
            "content_preferences": {"excluded_topics": []}
        }))
        .unwrap()
    }

    fn sample_article(content_len: usize) -> Article {
        Article {
            id: "a1".to_string(),
            title: "Title".to_string(),
            source_name: "Source".to_string(),
            published_at: Some(Utc::now()),
            url: "https://example.com".to_string(),
            content: "x".repeat(content_len),
            entities: vec![],
            embedding_summary: None,
        }
    }

    #[test]
    fn resolves_explicit_perspective_over_profile_and_default() {
        let p = resolve_perspective(Some("executive_summary"), &profile());
        assert_eq!(p.id, "executive_summary");
    }

    #[test]
    fn falls_back_to_default_when_nothing_specified() {
        let p = resolve_perspective(None, &profile());
        assert_eq!(p.id, "daily_intelligence_brief");
    }

    #[test]
    fn curated_context_carries_token_metadata() {
        let articles = vec![sample_article(100)];
        let context = curate_for_narrative_synthesis(
            &profile(),
            None,
            articles,
            PerceptionBundle::default(),
            AnomalyReport::no_baseline(),
            vec![],
            &[],
        );
        assert!(context.token_metadata.estimated_tokens > 0);
        assert_eq!(context.token_metadata.articles_included, 1);
    }

    #[test]
    fn compression_drops_articles_when_over_budget() {
        let articles: Vec<Article> = (0..40).map(|_| sample_article(5_000)).collect();
        let context = curate_for_narrative_synthesis(
            &profile(),
            None,
            articles,
            PerceptionBundle::default(),
            AnomalyReport::no_baseline(),
            vec![],
            &[],
        );
        assert!(context.token_metadata.articles_included <= 30);
        assert!(context.token_metadata.articles_dropped > 0);
    }

    proptest! {
        /// §8: the token budgeter is idempotent -- re-applying the
        /// compression schedule to an already-compressed
        /// (articles, historical) pair changes neither further, for any
        /// article count and content length.
        #[test]
        fn enforce_budget_is_idempotent(
            article_count in 0usize..60,
            content_len in 0usize..8_000,
            historical_count in 0usize..8,
        ) {
            let budget = TokenBudget::default();
            let articles: Vec<Article> = (0..article_count).map(|_| sample_article(content_len)).collect();
            let historical: Vec<HistoricalEntry> = (0..historical_count)
                .map(|i| HistoricalEntry { generated_at: format!("day-{i}"), summary: "s".repeat(50) })
                .collect();

            let (once_articles, once_historical, _once_trimmed) =
                enforce_budget(&budget, articles, historical);
            let (twice_articles, twice_historical, twice_trimmed) = enforce_budget(
                &budget,
                once_articles.clone(),
                once_historical.clone(),
            );

            prop_assert_eq!(once_articles.len(), twice_articles.len());
            prop_assert_eq!(once_historical.len(), twice_historical.len());
            prop_assert!(!twice_trimmed, "a second compression pass must never trim further");
        }
    }
}

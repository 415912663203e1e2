//! Perception extraction (C11): a single LLM call that surfaces entities,
//! connections, and event sequences spanning multiple articles, ahead of
//! synthesis. Cardinality limits named in the extraction prompt are not
//! trusted -- they're enforced again here as a post-filter, since an LLM
//! is not a reliable cardinality enforcer.

use std::sync::Arc;

use crate::error::Result;
use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::{Article, PerceptionBundle};

const MIN_ENTITY_ARTICLES: usize = 2;
const MIN_CONNECTION_ARTICLES: usize = 3;
const MAX_ENTITIES: usize = 10;
const MAX_CONNECTIONS: usize = 8;
const MAX_SEQUENCES: usize = 5;

const SYSTEM_PROMPT: &str = "You read a batch of news articles and extract cross-article \
    patterns. Identify: entity_mentions (people, places, or organizations that appear in \
    multiple articles), cross_article_connections (a shared theme linking several articles), and \
    event_sequences (a temporal progression spanning several articles). Respond with JSON only: \
    {\"entity_mentions\": [{\"entity\": str, \"type\": str, \"article_ids\": [int], \"contexts\": \
    [str]}], \"cross_article_connections\": [{\"theme\": str, \"article_ids\": [int], \
    \"connection\": str}], \"event_sequences\": [{\"sequence\": str, \"article_ids\": [int], \
    \"timeframe\": str}]}. Maximum 10 entities, 8 connections, 5 sequences. Only include an \
    entity if it appears in at least 2 articles, and a connection if it spans at least 3 \
    articles.";

fn render_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("[{}] {} ({})\n{}", i, a.title, a.source_name, a.display_content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extract cross-article perception patterns for `articles` via a single
/// LLM call at `temperature = 0.3`. On any failure, returns an empty
/// bundle rather than propagating an error, so a perception-layer outage
/// never blocks curation.
pub async fn extract_perception(llm: Arc<dyn LLMClient>, articles: &[Article]) -> PerceptionBundle {
    match extract_perception_inner(llm, articles).await {
        Ok(bundle) => enforce_cardinality(bundle),
        Err(_) => PerceptionBundle::default(),
    }
}

async fn extract_perception_inner(
    llm: Arc<dyn LLMClient>,
    articles: &[Article],
) -> Result<PerceptionBundle> {
    let request = CompletionRequest::new()
        .with_system(SYSTEM_PROMPT)
        .with_message(ChatMessage::user(render_articles(articles)))
        .with_max_tokens(3000)
        .with_temperature(0.3);

    let completion = llm.complete(request).await?;
    decode(&completion.content)
}

fn enforce_cardinality(mut bundle: PerceptionBundle) -> PerceptionBundle {
    bundle.entity_mentions.retain(|e| e.article_ids.len() >= MIN_ENTITY_ARTICLES);
    bundle.entity_mentions.truncate(MAX_ENTITIES);

    bundle
        .cross_article_connections
        .retain(|c| c.article_ids.len() >= MIN_CONNECTION_ARTICLES);
    bundle.cross_article_connections.truncate(MAX_CONNECTIONS);

    bundle.event_sequences.truncate(MAX_SEQUENCES);

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrossArticleConnection, EntityMention};

    #[test]
    fn cardinality_filter_drops_under_threshold_entities_and_connections() {
        let bundle = PerceptionBundle {
            entity_mentions: vec![
                EntityMention {
                    entity: "Jane Doe".to_string(),
                    entity_type: "person".to_string(),
                    article_ids: vec![0, 1],
                    contexts: vec![],
                },
                EntityMention {
                    entity: "Solo Corp".to_string(),
                    entity_type: "organization".to_string(),
                    article_ids: vec![0],
                    contexts: vec![],
                },
            ],
            cross_article_connections: vec![CrossArticleConnection {
                theme: "zoning dispute".to_string(),
                article_ids: vec![0, 1],
                connection: "two articles, below threshold".to_string(),
            }],
            event_sequences: vec![],
        };
        let filtered = enforce_cardinality(bundle);
        assert_eq!(filtered.entity_mentions.len(), 1);
        assert_eq!(filtered.entity_mentions[0].entity, "Jane Doe");
        assert!(filtered.cross_article_connections.is_empty());
    }

    #[test]
    fn cardinality_filter_caps_at_maximums() {
        let entities = (0..15)
            .map(|i| EntityMention {
                entity: format!("Entity {i}"),
                entity_type: "misc".to_string(),
                article_ids: vec![0, 1],
                contexts: vec![],
            })
            .collect();
        let bundle = PerceptionBundle {
            entity_mentions: entities,
            cross_article_connections: vec![],
            event_sequences: vec![],
        };
        let filtered = enforce_cardinality(bundle);
        assert_eq!(filtered.entity_mentions.len(), MAX_ENTITIES);
    }
}

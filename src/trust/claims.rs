//! Claim decomposition and classification (C5).
//!
//! Splits an AI-authored response into discrete claims and assigns each
//! a closed epistemic type. This is the entry point to the trust
//! verification pipeline: everything downstream (C6-C9) operates on the
//! claim list this module produces.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::Claim;

const SYSTEM_PROMPT: &str = "You decompose AI-generated text into discrete claims. For each \
    claim, classify it as exactly one of FACT (a checkable, objective assertion), INFERENCE (a \
    reasoned conclusion drawn from facts), SPECULATION (an unfounded guess about the future or \
    unknown), or OPINION (a subjective value judgment). Respond with JSON only: \
    {\"claims\": [{\"text\": str, \"type\": \"FACT\"|\"INFERENCE\"|\"SPECULATION\"|\"OPINION\", \
    \"confidence\": number between 0 and 1, \"reasoning\": str}]}";

#[derive(Debug, Deserialize)]
struct ClaimsResponse {
    claims: Vec<Claim>,
}

/// Decompose `response_text` into classified claims via a single LLM call.
pub async fn extract_claims(llm: Arc<dyn LLMClient>, response_text: &str) -> Result<Vec<Claim>> {
    let request = CompletionRequest::new()
        .with_system(SYSTEM_PROMPT)
        .with_message(ChatMessage::user(response_text))
        .with_max_tokens(3000)
        .with_temperature(0.0);

    let completion = llm.complete(request).await?;
    // §4.2/§4.5: a parse failure is a documented default, not a
    // propagated error -- callers always get a well-formed (possibly
    // empty) claim list rather than an `Err` to handle.
    Ok(decode::<ClaimsResponse>(&completion.content)
        .map(|parsed| parsed.claims)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_response_decodes_from_llm_shaped_json() {
        let raw = r#"{"claims": [
            {"text": "The bridge reopened Tuesday", "type": "FACT", "confidence": 0.95, "reasoning": "stated directly"},
            {"text": "Traffic will likely improve", "type": "SPECULATION", "confidence": 0.4, "reasoning": "no evidence given"}
        ]}"#;
        let parsed: ClaimsResponse = decode(raw).unwrap();
        assert_eq!(parsed.claims.len(), 2);
        assert!(parsed.claims[0].claim_type.is_verifiable());
        assert!(!parsed.claims[1].claim_type.is_verifiable());
    }

    #[tokio::test]
    async fn unparseable_response_yields_empty_claim_list_not_an_error() {
        use crate::llm::{EmbeddingRequest, EmbeddingResponse, ModelSpec, Provider};

        struct GarbledClient;

        #[async_trait::async_trait]
        impl LLMClient for GarbledClient {
            async fn complete(&self, _request: CompletionRequest) -> Result<crate::llm::CompletionResponse> {
                Ok(crate::llm::CompletionResponse {
                    id: "test".to_string(),
                    model: "test".to_string(),
                    content: "not json at all".to_string(),
                    stop_reason: None,
                    usage: Default::default(),
                    timestamp: chrono::Utc::now(),
                    cost: None,
                })
            }

            async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse> {
                unreachable!()
            }

            fn provider(&self) -> Provider {
                Provider::Anthropic
            }

            fn available_models(&self) -> Vec<ModelSpec> {
                Vec::new()
            }
        }

        let claims = extract_claims(Arc::new(GarbledClient), "some response").await.unwrap();
        assert!(claims.is_empty());
    }
}

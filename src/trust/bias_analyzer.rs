//! Bias analysis (C7): framing, unstated assumptions, omissions, and
//! loaded language in an AI-authored response.

use std::sync::Arc;

use crate::error::Result;
use crate::json_decode::decode;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::model::BiasAnalysis;

const SYSTEM_PROMPT: &str = "You analyze a piece of AI-generated text for bias. Identify: \
    framing issues (a claim presented with a slanted frame), assumptions (unstated premises the \
    text relies on), omissions (perspectives or facts the text leaves out), and loaded terms \
    (words carrying unwarranted emotional weight). Respond with JSON only: {\"framing_issues\": \
    [{\"frame_type\": str, \"text\": str, \"effect\": str, \"alternative\": str}], \
    \"assumptions\": [{\"assumption\": str, \"basis\": str, \"impact\": str}], \"omissions\": \
    [{\"missing_perspective\": str, \"relevance\": str, \"suggestion\": str}], \"loaded_terms\": \
    [{\"term\": str, \"connotation\": str, \"neutral_alternative\": str}]}. Use empty lists when \
    a category has no issues.";

/// Analyze `response_text` for bias via a single LLM call.
pub async fn analyze_bias(llm: Arc<dyn LLMClient>, response_text: &str) -> Result<BiasAnalysis> {
    let request = CompletionRequest::new()
        .with_system(SYSTEM_PROMPT)
        .with_message(ChatMessage::user(response_text))
        .with_max_tokens(2000)
        .with_temperature(0.0);

    let completion = llm.complete(request).await?;
    decode(&completion.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bias_analysis_with_all_four_categories() {
        let raw = r#"{
            "framing_issues": [{"frame_type": "loaded", "text": "crackdown", "effect": "implies excess force", "alternative": "enforcement action"}],
            "assumptions": [],
            "omissions": [{"missing_perspective": "affected residents", "relevance": "critical to understanding impact", "suggestion": "include resident quotes"}],
            "loaded_terms": []
        }"#;
        let analysis: BiasAnalysis = decode(raw).unwrap();
        assert_eq!(analysis.framing_issues.len(), 1);
        assert_eq!(analysis.high_severity_count(), 2);
    }
}

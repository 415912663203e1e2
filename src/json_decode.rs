//! Tolerant JSON extraction from raw LLM output (C2).
//!
//! Every component that asks an LLM for structured JSON goes through this
//! module rather than calling `serde_json::from_str` directly on the raw
//! completion text, since models routinely wrap their JSON in markdown
//! code fences or prepend a sentence of commentary.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Strip a leading/trailing ```json or ``` fence, if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_leading = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_start();
    without_leading
        .strip_suffix("```")
        .unwrap_or(without_leading)
        .trim()
}

/// Extract the first `{...}` JSON object from a string, after stripping
/// fences. Uses the first `{` and the last `}` in the remaining text,
/// which tolerates a leading "Here is the analysis:" sentence and a
/// trailing aside, as long as the JSON body itself is well-formed.
pub fn extract_json_object(text: &str) -> Result<&str> {
    let stripped = strip_fences(text);
    let start = stripped
        .find('{')
        .ok_or_else(|| Error::llm_parse_failure("no JSON object found in response"))?;
    let end = stripped
        .rfind('}')
        .ok_or_else(|| Error::llm_parse_failure("no JSON object found in response"))?;
    if end < start {
        return Err(Error::llm_parse_failure("malformed JSON object boundaries in response"));
    }
    Ok(&stripped[start..=end])
}

/// Extract and decode a JSON object from raw LLM output into `T`.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let object = extract_json_object(text)?;
    serde_json::from_str(object)
        .map_err(|e| Error::llm_parse_failure(format!("response did not match expected shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        ok: bool,
    }

    #[test]
    fn decodes_bare_json() {
        let sample: Sample = decode(r#"{"ok": true}"#).unwrap();
        assert_eq!(sample, Sample { ok: true });
    }

    #[test]
    fn decodes_json_wrapped_in_fences() {
        let text = "```json\n{\"ok\": true}\n```";
        let sample: Sample = decode(text).unwrap();
        assert_eq!(sample, Sample { ok: true });
    }

    #[test]
    fn decodes_json_with_leading_and_trailing_commentary() {
        let text = "Here is the analysis:\n{\"ok\": true}\nLet me know if you need more.";
        let sample: Sample = decode(text).unwrap();
        assert_eq!(sample, Sample { ok: true });
    }

    #[test]
    fn missing_object_is_a_parse_failure() {
        let result: Result<Sample> = decode("no json here");
        assert!(matches!(result, Err(Error::LLMParseFailure(_))));
    }
}

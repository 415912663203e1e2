//! Authoritative source registry (C3).
//!
//! A small YAML-configured list of trusted reference sources (e.g. a
//! government leadership page, a standards body's current-spec page)
//! that the fact verifier consults for time-sensitive claims instead of
//! relying on an LLM's training-data recall. If the configured YAML
//! fails to parse, the registry falls back to empty rather than failing
//! the whole pipeline -- an empty registry just means every claim goes
//! through without a source match, which C6 already handles.

use std::sync::Arc;

use serde::Deserialize;

use crate::json_decode::decode;
use crate::llm::LLMClient;
use crate::model::{AuthoritativeSource, SourceFallback};

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    sources: Vec<AuthoritativeSource>,
}

/// The loaded set of authoritative sources, plus matching logic.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<AuthoritativeSource>,
}

impl SourceRegistry {
    /// Parse a registry from YAML text. On parse failure, returns an
    /// empty, disabled registry rather than propagating the error.
    pub fn from_yaml(yaml: &str) -> Self {
        match serde_yaml_ng::from_str::<RegistryFile>(yaml) {
            Ok(file) => Self {
                sources: file.sources.into_iter().filter(|s| s.is_well_formed()).collect(),
            },
            Err(_) => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[AuthoritativeSource] {
        &self.sources
    }

    /// Keyword-overlap score between a claim's text and a source's
    /// keyword list: the fraction of the source's keywords that appear
    /// (case-insensitively, as substrings) in the claim text.
    fn keyword_score(claim_text: &str, source: &AuthoritativeSource) -> f64 {
        if source.keywords.is_empty() {
            return 0.0;
        }
        let haystack = claim_text.to_lowercase();
        let hits = source
            .keywords
            .iter()
            .filter(|kw| haystack.contains(&kw.to_lowercase()))
            .count();
        hits as f64 / source.keywords.len() as f64
    }

    /// Find the best-matching source for a claim by keyword overlap.
    /// Returns `Ok(None)` (with a populated fallback reason) when no
    /// source scores above the match threshold, and an ambiguity error
    /// when two or more sources tie for the best score above threshold.
    pub fn best_match(
        &self,
        claim_id: &str,
        claim_text: &str,
    ) -> crate::error::Result<Option<(&AuthoritativeSource, SourceFallback)>> {
        const MATCH_THRESHOLD: f64 = 0.34;

        if self.sources.is_empty() {
            return Ok(None);
        }

        let mut scored: Vec<(&AuthoritativeSource, f64)> = self
            .sources
            .iter()
            .map(|s| (s, Self::keyword_score(claim_text, s)))
            .filter(|(_, score)| *score >= MATCH_THRESHOLD)
            .collect();

        if scored.is_empty() {
            return Ok(None);
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top_score = scored[0].1;
        let tied: Vec<_> = scored.iter().filter(|(_, s)| *s == top_score).collect();
        if tied.len() > 1 {
            return Err(crate::error::Error::source_match_ambiguous(claim_id, tied.len()));
        }

        Ok(Some((
            scored[0].0,
            SourceFallback {
                enabled: true,
                reason: format!("matched source '{}' at score {:.2}", scored[0].0.name, top_score),
            },
        )))
    }

    /// Present the source catalogue to the LLM and ask it to pick the
    /// best match by id, emphasising geographic specificity (§4.3's
    /// LLM-mediated lookup mode, a fuzzier alternative to
    /// [`SourceRegistry::best_match`]'s keyword scoring). Returns `None`
    /// when the registry is empty, the model declines to match, or the
    /// returned id is out of range -- on any of these, the caller should
    /// fall back to the fallback descriptor, not raise.
    pub async fn best_match_llm(
        &self,
        llm: Arc<dyn LLMClient>,
        claim_text: &str,
    ) -> crate::error::Result<Option<&AuthoritativeSource>> {
        if self.sources.is_empty() {
            return Ok(None);
        }

        let catalogue = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{i}: {} (keywords: {})", s.name, s.keywords.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");

        let request = crate::llm::CompletionRequest::new()
            .with_system(
                "You match a factual claim to the single best authoritative source from a \
                 catalogue, prioritizing geographic specificity (a source naming the exact \
                 country/region the claim concerns beats a generic one). Respond with JSON \
                 only: {\"best_match_id\": int or null, \"confidence\": number 0-1, \
                 \"reasoning\": str}. Use null when no source in the catalogue is a good match.",
            )
            .with_message(crate::llm::ChatMessage::user(format!(
                "Sources:\n{catalogue}\n\nClaim: {claim_text}"
            )))
            .with_max_tokens(200)
            .with_temperature(0.0);

        #[derive(Debug, Deserialize)]
        struct MatchResponse {
            best_match_id: Option<usize>,
            #[allow(dead_code)]
            #[serde(default)]
            confidence: f64,
            #[allow(dead_code)]
            #[serde(default)]
            reasoning: String,
        }

        let completion = llm.complete(request).await?;
        let parsed: MatchResponse = match decode(&completion.content) {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };

        Ok(parsed.best_match_id.and_then(|id| self.sources.get(id)))
    }

    /// Resolve a source's URL, substituting `{country}` in a template
    /// source using a country extracted from the claim text via an LLM
    /// call. Wikipedia-style templates use the underscore slug form
    /// (`United_States`); every other template uses the hyphen form
    /// (`united-states`), per §4.3. Non-template sources return their
    /// fixed URL unchanged.
    pub async fn resolve_url(
        &self,
        source: &AuthoritativeSource,
        claim_text: &str,
        llm: Arc<dyn LLMClient>,
    ) -> crate::error::Result<String> {
        if let Some(url) = &source.url {
            return Ok(url.clone());
        }

        let template = source
            .url_template
            .as_ref()
            .ok_or_else(|| crate::error::Error::schema_invariant("source has neither url nor url_template"))?;

        if !source.requires_country_extraction {
            return Ok(template.clone());
        }

        #[derive(Debug, Deserialize)]
        struct CountryExtraction {
            #[allow(dead_code)]
            country: String,
            slug_hyphen: String,
            slug_underscore: String,
        }

        let request = crate::llm::CompletionRequest::new()
            .with_system(
                "Extract the single country this claim is about. Respond with JSON only: \
                 {\"country\": str, \"slug_hyphen\": str, \"slug_underscore\": str}, where \
                 slug_hyphen is the country name lowercased with spaces replaced by hyphens \
                 (e.g. \"united-states\") and slug_underscore is the same with underscores \
                 and the country's canonical capitalization (e.g. \"United_States\", matching \
                 Wikipedia article title conventions).",
            )
            .with_message(crate::llm::ChatMessage::user(claim_text))
            .with_max_tokens(64)
            .with_temperature(0.0);

        let response = llm.complete(request).await?;
        let extraction: CountryExtraction = decode(&response.content).map_err(|_| {
            crate::error::Error::source_match_ambiguous(claim_text, 0)
        })?;

        let slug = if template.to_lowercase().contains("wikipedia") {
            &extraction.slug_underscore
        } else {
            &extraction.slug_hyphen
        };
        Ok(template.replace("{country}", slug))
    }
}

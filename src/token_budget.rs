//! Token estimation and budget enforcement (C10).
//!
//! Token counts are approximated at 4 characters per token, the same
//! coarse heuristic the curator's Python ancestor used rather than
//! calling out to a tokenizer. Every curated context produced by this
//! module carries a `TokenMetadata` record so downstream consumers and
//! tests can see how the budget was actually spent.

use serde::{Deserialize, Serialize};

const CHARS_PER_TOKEN: usize = 4;

pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// Fixed token allocation across a curated context's sections.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    pub system_prompt: usize,
    pub articles: usize,
    pub historical: usize,
    pub response: usize,
    pub safety_margin: usize,
}

impl TokenBudget {
    pub const CONTEXT_WINDOW: usize = 200_000;

    pub fn total(&self) -> usize {
        self.system_prompt + self.articles + self.historical + self.response + self.safety_margin
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        let system_prompt = 5_000;
        let articles = 50_000;
        let historical = 10_000;
        let response = 8_000;
        let safety_margin =
            Self::CONTEXT_WINDOW - system_prompt - articles - historical - response;
        Self {
            system_prompt,
            articles,
            historical,
            response,
            safety_margin,
        }
    }
}

/// Accounting attached to every curated context describing what was
/// actually used against the budget, and what compression (if any) was
/// applied to fit it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub estimated_tokens: usize,
    pub budget_tokens: usize,
    pub articles_included: usize,
    pub articles_dropped: usize,
    pub historical_trimmed: bool,
}

impl TokenMetadata {
    pub fn within_budget(&self) -> bool {
        self.estimated_tokens <= self.budget_tokens
    }
}

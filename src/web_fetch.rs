//! Web fetcher (C4): fetches a URL, reduces it to readable text, and
//! answers a caller-supplied question about it using a single LLM call
//! grounded only in the fetched content.

use std::sync::Arc;
use std::time::Duration;

use readability::extractor;

use crate::error::{Error, Result};
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};

const MAX_CONTENT_CHARS: usize = 50_000;
const TRUNCATION_MARKER: &str = "\n\n[Content truncated for length...]";

/// A reduced, plain-text rendering of a fetched page.
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Fetches `url`, reduces its HTML to readable text via the `readability`
/// extraction algorithm, strips any remaining script/style/nav/footer/
/// header markup, and truncates to `MAX_CONTENT_CHARS`.
pub async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedPage> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| Error::fetch_timeout(url, timeout.as_millis() as u64))?
        .map_err(|e| Error::fetch_network(url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::fetch_http(url, status.as_u16()));
    }

    let html = response
        .text()
        .await
        .map_err(|e| Error::fetch_network(url, e.to_string()))?;

    let parsed_url = url::Url::parse(url)
        .map_err(|_| Error::fetch_network(url, "could not parse fetch URL".to_string()))?;
    let extracted = extractor::extract(&mut html.as_bytes(), &parsed_url)
        .map_err(|e| Error::fetch_network(url, format!("readability extraction failed: {e}")))?;

    let mut text = strip_residual_tags(&extracted.text);
    if text.chars().count() > MAX_CONTENT_CHARS {
        let truncated: String = text.chars().take(MAX_CONTENT_CHARS).collect();
        text = format!("{truncated}{TRUNCATION_MARKER}");
    }

    Ok(FetchedPage {
        url: url.to_string(),
        title: Some(extracted.title).filter(|t| !t.is_empty()),
        text,
    })
}

/// Best-effort removal of script/style/nav/footer/header content that
/// the readability pass sometimes leaves behind.
fn strip_residual_tags(input: &str) -> String {
    let re = regex::Regex::new(
        r"(?is)<(script|style|nav|footer|header)[^>]*>.*?</(script|style|nav|footer|header)>",
    )
    .expect("static regex is valid");
    let without_blocks = re.replace_all(input, "");
    let tag_re = regex::Regex::new(r"(?s)<[^>]+>").expect("static regex is valid");
    tag_re.replace_all(&without_blocks, "").trim().to_string()
}

/// Answer `question` using only the fetched page's content, via a single
/// LLM call. Typed fetch failures propagate to the caller so C6's
/// temporal check can record them under `method = "webfetch_error"`.
pub async fn answer_from_page(
    http: &reqwest::Client,
    llm: Arc<dyn LLMClient>,
    url: &str,
    question: &str,
    timeout: Duration,
) -> Result<String> {
    let page = fetch_page(http, url, timeout).await?;

    let request = CompletionRequest::new()
        .with_system(
            "Answer the question using only the information in the provided page content. If \
             the page does not answer the question, say so explicitly.",
        )
        .with_message(ChatMessage::user(format!(
            "Page content from {}:\n\n{}\n\nQuestion: {}",
            page.url, page.text, question
        )))
        .with_max_tokens(500);

    let response = llm.complete(request).await?;
    Ok(response.content)
}

//! BrowserQL backend: a single GraphQL mutation that opens the page and returns its text.

use super::{ContentExtractor, ExtractionError, non_empty};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const SCRAPE_MUTATION: &str = r#"
mutation Scrape($target: String!) {
  goto(url: $target, waitUntil: firstContentfulPaint) { status time }
  pageText: text { text }
}
"#;

/// Extractor that posts a BrowserQL mutation to a hosted endpoint.
pub struct BrowserQlExtractor {
    pub(crate) http: Client,
    pub(crate) endpoint: String,
    pub(crate) timeout: Duration,
}

impl BrowserQlExtractor {
    /// Build an extractor for `endpoint`; the whole request is bounded by `timeout`.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .user_agent("instant-bookmark/extract")
            .timeout(timeout)
            .build()
            .map_err(|error| ExtractionError::Session(error.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }
}

#[async_trait]
impl ContentExtractor for BrowserQlExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractionError> {
        tracing::debug!(%url, "Requesting page text from BrowserQL");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({
                "query": SCRAPE_MUTATION,
                "variables": { "target": url },
            }))
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ExtractionError::Timeout(self.timeout)
                } else {
                    ExtractionError::Session(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Backend(format!(
                "BrowserQL HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let body: ScrapeResponse = response.json().await.map_err(|error| {
            ExtractionError::Backend(format!("invalid BrowserQL response: {error}"))
        })?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            return Err(ExtractionError::Backend(format!(
                "BrowserQL error: {}",
                Value::Array(errors)
            )));
        }

        let text = body
            .data
            .and_then(|data| data.page_text)
            .and_then(|page| page.text)
            .ok_or(ExtractionError::EmptyResult)?;
        let text = non_empty(text)?;
        tracing::debug!(%url, chars = text.chars().count(), "BrowserQL extraction complete");
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(rename = "pageText", default)]
    page_text: Option<PageText>,
}

#[derive(Debug, Deserialize)]
struct PageText {
    #[serde(default)]
    text: Option<String>,
}

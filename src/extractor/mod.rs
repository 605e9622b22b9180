//! Page text extraction through a headless browser.
//!
//! Two backends are available: a hosted BrowserQL endpoint reached over HTTP, and a Playwright
//! MCP server spawned as a child process. [`get_content_extractor`] picks one from
//! [`BrowserConnection`].

pub mod browserql;
pub mod playwright;

use crate::config::{BrowserConnection, Config};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use browserql::BrowserQlExtractor;
pub use playwright::PlaywrightMcpExtractor;

/// Failures raised while extracting page text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Browser session could not be established.
    #[error("Failed to start browser session: {0}")]
    Session(String),
    /// Page did not finish loading within the configured bound.
    #[error("Extraction timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Automation backend reported an error.
    #[error("Browser backend error: {0}")]
    Backend(String),
    /// Backend answered without any page text.
    #[error("Browser backend returned no page text")]
    EmptyResult,
}

/// Extracts the visible text of a web page.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Load `url` in a fresh browser session and return its flattened text.
    async fn extract(&self, url: &str) -> Result<String, ExtractionError>;
}

/// Construct the extractor selected by configuration.
pub fn get_content_extractor(
    config: &Config,
) -> Result<Arc<dyn ContentExtractor>, ExtractionError> {
    match &config.browser_connection {
        BrowserConnection::BrowserQl(endpoint) => {
            tracing::info!("Using BrowserQL content extractor");
            let extractor = BrowserQlExtractor::new(endpoint.clone(), config.extraction_timeout)?;
            Ok(Arc::new(extractor))
        }
        BrowserConnection::PlaywrightMcp { program, args } => {
            tracing::info!(%program, "Using Playwright MCP content extractor");
            Ok(Arc::new(PlaywrightMcpExtractor::new(
                program.clone(),
                args.clone(),
                config.extraction_timeout,
            )))
        }
    }
}

pub(crate) fn non_empty(text: String) -> Result<String, ExtractionError> {
    if text.trim().is_empty() {
        Err(ExtractionError::EmptyResult)
    } else {
        Ok(text)
    }
}

//! Ingestion pipeline: extract or upload, summarize, then commit.

use super::request::{IngestContent, IngestRequest, SummaryMode};
use crate::bookmark::{BookmarkPage, BookmarkSource, CommitReceipt, ContentSummary, ImageFile};
use crate::config::Config;
use crate::extractor::{ContentExtractor, ExtractionError, get_content_extractor};
use crate::notion::{CommitError, FileUploader, NotionClient, NotionError, PageCommitter, UploadError};
use crate::summarization::{ContentSummarizer, LlmSummarizer};
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

/// Step failures that abort an ingestion; reported to clients with status 500.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Page text could not be extracted.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    /// Screenshot could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
    /// Bookmark page could not be created.
    #[error("Notion error: {0}")]
    Commit(#[from] CommitError),
}

/// Errors raised while wiring the pipeline at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Extraction backend could not be initialised.
    #[error(transparent)]
    Extractor(#[from] ExtractionError),
    /// Document store client could not be initialised.
    #[error(transparent)]
    Notion(#[from] NotionError),
}

/// Runs one ingestion request through its collaborators.
///
/// Holds no per-request state; concurrent calls are independent.
#[derive(Clone)]
pub struct IngestService {
    extractor: Arc<dyn ContentExtractor>,
    summarizer: Arc<dyn ContentSummarizer>,
    uploader: Arc<dyn FileUploader>,
    committer: Arc<dyn PageCommitter>,
}

impl IngestService {
    /// Assemble a service from explicit collaborators.
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        summarizer: Arc<dyn ContentSummarizer>,
        uploader: Arc<dyn FileUploader>,
        committer: Arc<dyn PageCommitter>,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            uploader,
            committer,
        }
    }

    /// Build the production pipeline from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let extractor = get_content_extractor(config)?;
        let summarizer = Arc::new(LlmSummarizer::from_config(config));
        let notion = Arc::new(NotionClient::new(config)?);
        Ok(Self::new(extractor, summarizer, notion.clone(), notion))
    }

    /// Run the pipeline for a validated request.
    pub async fn ingest(&self, request: IngestRequest) -> Result<CommitReceipt, IngestError> {
        let IngestRequest {
            content,
            mode,
            notes,
        } = request;
        match content {
            IngestContent::Url(url) => self.ingest_url(url, mode, notes).await,
            IngestContent::Image(file) => self.ingest_image(file, mode, notes).await,
        }
    }

    async fn ingest_url(
        &self,
        url: Url,
        mode: SummaryMode,
        notes: Option<String>,
    ) -> Result<CommitReceipt, IngestError> {
        let summary = match mode {
            SummaryMode::Manual { title, summary } => ContentSummary::new(title, summary),
            SummaryMode::Auto { title, summary } => {
                tracing::debug!(%url, "Extracting page text");
                let text = self.extractor.extract(url.as_str()).await.map_err(|error| {
                    tracing::warn!(%url, %error, "Extraction failed");
                    error
                })?;
                tracing::debug!(chars = text.chars().count(), "Summarizing page text");
                self.summarizer
                    .summarize_text(&text)
                    .await
                    .with_overrides(title, summary)
            }
        };

        let page = BookmarkPage {
            title: summary.title,
            summary: summary.summary,
            source: BookmarkSource::Url,
            url: Some(url.into()),
            upload: None,
            notes,
        };
        self.commit(&page).await
    }

    async fn ingest_image(
        &self,
        file: ImageFile,
        mode: SummaryMode,
        notes: Option<String>,
    ) -> Result<CommitReceipt, IngestError> {
        tracing::debug!(filename = %file.filename, bytes = file.bytes.len(), "Uploading screenshot");
        let handle = self.uploader.upload(&file).await.map_err(|error| {
            tracing::warn!(%error, "Upload failed");
            error
        })?;

        let summary = match mode {
            SummaryMode::Manual { title, summary } => ContentSummary::new(title, summary),
            SummaryMode::Auto { title, summary } => {
                tracing::debug!("Summarizing screenshot");
                self.summarizer
                    .summarize_image(&file)
                    .await
                    .with_overrides(title, summary)
            }
        };

        let page = BookmarkPage {
            title: summary.title,
            summary: summary.summary,
            source: BookmarkSource::Screenshot,
            url: None,
            upload: Some(handle),
            notes,
        };
        self.commit(&page).await
    }

    async fn commit(&self, page: &BookmarkPage) -> Result<CommitReceipt, IngestError> {
        self.committer.commit(page).await.map_err(|error| {
            if page.upload.is_some() {
                tracing::error!(%error, "Commit failed; uploaded file left unattached");
            } else {
                tracing::error!(%error, "Commit failed");
            }
            IngestError::from(error)
        })
    }
}

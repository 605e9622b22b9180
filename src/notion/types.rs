//! Shared types used by the Notion client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with the Notion API.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Notion URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Notion responded with a non-success status code.
    #[error("Unexpected Notion response ({status}): {message}")]
    UnexpectedStatus {
        /// HTTP status returned from Notion.
        status: StatusCode,
        /// Error message reported by Notion, or the raw body when it was not structured.
        message: String,
    },
    /// Notion answered successfully but the payload lacked required fields.
    #[error("Invalid Notion response: {0}")]
    InvalidResponse(String),
}

/// Failures of the two-phase file upload protocol.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The store rejected the upload or returned no id/upload URL.
    #[error("Failed to initiate file upload: {0}")]
    Initiation(#[source] NotionError),
    /// The store did not accept the file bytes.
    #[error("Failed to send file bytes: {0}")]
    Transfer(#[source] NotionError),
}

/// Failure to create the bookmark page.
#[derive(Debug, Error)]
#[error("Failed to save to Notion: {0}")]
pub struct CommitError(#[from] pub NotionError);

/// Response of `POST /file_uploads`.
#[derive(Debug, Deserialize)]
pub(crate) struct FileUploadResponse {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) upload_url: Option<String>,
}

/// Validated upload session returned by the initiate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadSession {
    /// Identifier later referenced by the image block.
    pub id: String,
    /// Address that receives the file bytes.
    pub upload_url: String,
}

/// Response of `POST /pages`.
#[derive(Debug, Deserialize)]
pub(crate) struct PageResponse {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) url: Option<String>,
}

/// Structured error body, e.g. `{"object":"error","code":"validation_error","message":"..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct NotionErrorBody {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

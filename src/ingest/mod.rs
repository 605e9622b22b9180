//! Ingestion orchestration: request validation and the extract/upload, summarize, commit
//! pipeline.

pub mod request;
pub mod service;

pub use request::{
    ImageData, ImagePayload, IngestContent, IngestForm, IngestRequest, JsonIngestBody,
    SummaryMode, ValidationError,
};
pub use service::{IngestError, IngestService, SetupError};

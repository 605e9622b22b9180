#![deny(missing_docs)]

//! Core library for the Instant Bookmark ingestion server.

/// HTTP routing and the ingestion handler.
pub mod api;
/// Data model shared by the pipeline stages.
pub mod bookmark;
/// Environment-driven configuration management.
pub mod config;
/// Headless-browser page text extraction.
pub mod extractor;
/// Request validation and the ingestion pipeline.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Notion file uploads and page creation.
pub mod notion;
/// LLM-backed title and summary generation.
pub mod summarization;

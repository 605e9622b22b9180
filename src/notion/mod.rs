//! Notion document store integration: file uploads and bookmark pages.

pub mod blocks;
pub mod client;
pub mod page;
pub mod types;
pub mod upload;

pub use client::NotionClient;
pub use page::PageCommitter;
pub use types::{CommitError, FileUploadSession, NotionError, UploadError};
pub use upload::FileUploader;

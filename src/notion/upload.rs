//! File store uploader backed by Notion's file upload API.

use crate::bookmark::{ImageFile, UploadHandle};
use crate::notion::{NotionClient, UploadError};
use async_trait::async_trait;

/// Stores binary files so that a later page can reference them.
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Upload `file` and return the handle that attaches it to a page.
    async fn upload(&self, file: &ImageFile) -> Result<UploadHandle, UploadError>;
}

#[async_trait]
impl FileUploader for NotionClient {
    /// Initiate a single-part upload, then send the bytes. No completion call is needed for
    /// single-part uploads; the returned id is attachable immediately.
    async fn upload(&self, file: &ImageFile) -> Result<UploadHandle, UploadError> {
        tracing::debug!(
            filename = %file.filename,
            bytes = file.bytes.len(),
            "Starting file upload"
        );
        let session = self
            .create_file_upload(&file.filename, &file.mime_type)
            .await
            .map_err(UploadError::Initiation)?;

        self.send_file_upload(&session, file)
            .await
            .map_err(UploadError::Transfer)?;

        tracing::info!(upload_id = %session.id, filename = %file.filename, "File uploaded");
        Ok(UploadHandle::new(session.id))
    }
}

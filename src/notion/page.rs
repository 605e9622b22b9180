//! Page committer backed by Notion's page creation API.

use crate::bookmark::{BookmarkPage, CommitReceipt};
use crate::notion::{CommitError, NotionClient, blocks::build_page_payload};
use async_trait::async_trait;

/// Writes finished bookmark pages to the document store.
#[async_trait]
pub trait PageCommitter: Send + Sync {
    /// Create one page for `page`. Repeated calls create repeated pages.
    async fn commit(&self, page: &BookmarkPage) -> Result<CommitReceipt, CommitError>;
}

#[async_trait]
impl PageCommitter for NotionClient {
    async fn commit(&self, page: &BookmarkPage) -> Result<CommitReceipt, CommitError> {
        let payload = build_page_payload(page, self.database_id());
        let block_count = payload
            .get("children")
            .and_then(|children| children.as_array())
            .map_or(0, Vec::len);
        tracing::debug!(
            source = page.source.label(),
            blocks = block_count,
            "Creating bookmark page"
        );

        let receipt = self.create_page(&payload).await?;
        tracing::info!(
            page_id = receipt.page_id.as_deref().unwrap_or("unknown"),
            source = page.source.label(),
            "Bookmark page created"
        );
        Ok(receipt)
    }
}

//! HTTP client wrapper for interacting with Notion.

use crate::bookmark::{CommitReceipt, ImageFile};
use crate::config::Config;
use crate::notion::types::{
    FileUploadResponse, FileUploadSession, NotionError, NotionErrorBody, PageResponse,
};
use reqwest::{
    Client, Method,
    multipart::{Form, Part},
};
use serde_json::{Value, json};

/// Lightweight HTTP client for the Notion endpoints used by bookmark ingestion.
pub struct NotionClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) version: String,
    pub(crate) database_id: String,
}

impl NotionClient {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, NotionError> {
        let client = Client::builder()
            .user_agent("instant-bookmark/0.3")
            .build()?;

        let base_url =
            normalize_base_url(&config.notion_base_url).map_err(NotionError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            version = %config.notion_version,
            database = %config.notion_database_id,
            "Initialized Notion HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.notion_api_key.clone(),
            version: config.notion_version.clone(),
            database_id: config.notion_database_id.clone(),
        })
    }

    /// Database that receives created pages.
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Start a single-part file upload and return its id and send address.
    pub async fn create_file_upload(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<FileUploadSession, NotionError> {
        let body = json!({
            "filename": filename,
            "content_type": content_type,
            "mode": "single_part",
        });

        let response = self
            .request(Method::POST, "file_uploads")
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let payload: FileUploadResponse = response.json().await?;
        match (non_empty(payload.id), non_empty(payload.upload_url)) {
            (Some(id), Some(upload_url)) => {
                tracing::debug!(upload_id = %id, "File upload created");
                Ok(FileUploadSession { id, upload_url })
            }
            (id, upload_url) => Err(NotionError::InvalidResponse(format!(
                "file upload response missing {}",
                match (id, upload_url) {
                    (None, None) => "id and upload_url",
                    (None, Some(_)) => "id",
                    _ => "upload_url",
                }
            ))),
        }
    }

    /// Send the file contents to the address returned by [`Self::create_file_upload`].
    pub async fn send_file_upload(
        &self,
        session: &FileUploadSession,
        file: &ImageFile,
    ) -> Result<(), NotionError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(&session.upload_url))
            .multipart(form)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::debug!(
            upload_id = %session.id,
            bytes = file.bytes.len(),
            "File bytes sent"
        );
        Ok(())
    }

    /// Create a page from a fully built payload.
    pub async fn create_page(&self, payload: &Value) -> Result<CommitReceipt, NotionError> {
        let response = self
            .request(Method::POST, "pages")
            .json(payload)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let page: PageResponse = response.json().await?;
        Ok(CommitReceipt {
            page_id: page.id,
            page_url: page.url,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.authorize(self.client.request(method, url))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, NotionError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            body
        }
    });
    let error = NotionError::UnexpectedStatus { status, message };
    tracing::error!(error = %error, "Notion request failed");
    Err(error)
}

fn error_message(body: &str) -> Option<String> {
    let parsed: NotionErrorBody = serde_json::from_str(body).ok()?;
    let message = non_empty(parsed.message)?;
    Some(match parsed.code {
        Some(code) if !code.is_empty() => format!("{message} ({code})"),
        _ => message,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    pub(crate) fn test_client(base_url: String) -> NotionClient {
        NotionClient {
            client: Client::builder()
                .user_agent("instant-bookmark-test")
                .build()
                .expect("client"),
            base_url,
            api_key: "ntn_test".into(),
            version: "2022-06-28".into(),
            database_id: "db-123".into(),
        }
    }

    #[test]
    fn endpoints_join_without_duplicate_slashes() {
        assert_eq!(
            format_endpoint("https://api.notion.com/v1/", "/pages"),
            "https://api.notion.com/v1/pages"
        );
        assert_eq!(
            normalize_base_url("https://api.notion.com/v1/").expect("url"),
            "https://api.notion.com/v1"
        );
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn structured_error_bodies_are_unwrapped() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"Title is not a property that exists."}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Title is not a property that exists. (validation_error)")
        );
        assert_eq!(error_message("plain text"), None);
    }

    #[tokio::test]
    async fn requests_carry_auth_and_version_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/pages")
                    .header("authorization", "Bearer ntn_test")
                    .header("notion-version", "2022-06-28");
                then.status(200)
                    .json_body(json!({ "id": "page-1", "url": "https://notion.so/page-1" }));
            })
            .await;

        let receipt = test_client(server.base_url())
            .create_page(&json!({ "parent": { "database_id": "db-123" } }))
            .await
            .expect("page created");

        mock.assert_async().await;
        assert_eq!(receipt.page_id.as_deref(), Some("page-1"));
        assert_eq!(receipt.page_url.as_deref(), Some("https://notion.so/page-1"));
    }

    #[tokio::test]
    async fn missing_upload_url_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/file_uploads");
                then.status(200).json_body(json!({ "id": "upload-1" }));
            })
            .await;

        let error = test_client(server.base_url())
            .create_file_upload("shot.png", "image/png")
            .await
            .expect_err("missing upload_url");

        assert!(
            matches!(&error, NotionError::InvalidResponse(message) if message.contains("upload_url")),
            "unexpected error: {error}"
        );
    }

    #[tokio::test]
    async fn empty_error_body_falls_back_to_reason_phrase() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/pages");
                then.status(502);
            })
            .await;

        let error = test_client(server.base_url())
            .create_page(&json!({}))
            .await
            .expect_err("bad gateway");

        match error {
            NotionError::UnexpectedStatus { status, message } => {
                assert_eq!(status.as_u16(), 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

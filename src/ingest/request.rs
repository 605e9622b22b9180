//! Wire-level ingestion form and its validation into an [`IngestRequest`].

use crate::bookmark::ImageFile;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use time::Date;

/// Validation failures, reported to clients with status 400.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Manual mode without a title.
    #[error("Title is required and cannot be empty when autoGenerate is false")]
    MissingTitle,
    /// Manual mode without a summary.
    #[error("Summary is required and cannot be empty when autoGenerate is false")]
    MissingSummary,
    /// URL request without a URL.
    #[error("URL (url) is required when type is \"url\"")]
    MissingUrl,
    /// URL that is not an absolute http(s) address.
    #[error("URL (url) must be an absolute http or https address")]
    InvalidUrl,
    /// Image request without image data.
    #[error("Base64 image data (data_b64) or a multipart file is required when type is \"image\"")]
    MissingImage,
    /// `data_b64` that is not valid base64.
    #[error("Image data (data_b64) is not valid base64")]
    InvalidImageData,
    /// Unknown or absent `type`.
    #[error("Invalid or missing \"type\" in payload. Must be \"url\" or \"image\".")]
    InvalidKind,
}

/// Image bytes as they arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// Base64 text from a JSON body, optionally prefixed with a `data:` URL header.
    Base64(String),
    /// Raw bytes from a multipart file field.
    Raw(Vec<u8>),
}

/// Image part of an ingestion form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Encoded or raw image contents.
    pub data: ImageData,
    /// Client-supplied file name.
    pub filename: Option<String>,
}

/// Unvalidated ingestion input, shared by the JSON and multipart decoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestForm {
    /// Declared kind: `"url"` or `"image"`.
    pub kind: Option<String>,
    /// Address to bookmark.
    pub url: Option<String>,
    /// Image to bookmark.
    pub image: Option<ImagePayload>,
    /// Whether to generate title and summary; `None` means yes.
    pub auto_generate: Option<bool>,
    /// Caller-supplied title.
    pub title: Option<String>,
    /// Caller-supplied summary.
    pub summary: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// JSON request body.
#[derive(Debug, Default, Deserialize)]
pub struct JsonIngestBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    data_b64: Option<String>,
    #[serde(default)]
    thoughts: Option<String>,
    #[serde(rename = "autoGenerate", default)]
    auto_generate: Option<bool>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl From<JsonIngestBody> for IngestForm {
    fn from(body: JsonIngestBody) -> Self {
        let image = body.data_b64.map(|data| ImagePayload {
            data: ImageData::Base64(data),
            filename: body.filename,
        });
        Self {
            kind: body.kind,
            url: body.url,
            image,
            auto_generate: body.auto_generate,
            title: body.title,
            summary: body.summary,
            notes: body.thoughts,
        }
    }
}

/// What is being bookmarked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestContent {
    /// A web page.
    Url(Url),
    /// An uploaded screenshot.
    Image(ImageFile),
}

impl IngestContent {
    /// Lowercase kind used in logs and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Image(_) => "image",
        }
    }
}

/// Where the title and summary come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryMode {
    /// Generated by the summarizer; any caller value here takes precedence.
    Auto {
        /// Caller title override.
        title: Option<String>,
        /// Caller summary override.
        summary: Option<String>,
    },
    /// Supplied by the caller; the summarizer is not invoked.
    Manual {
        /// Non-empty title.
        title: String,
        /// Non-empty summary.
        summary: String,
    },
}

/// Validated ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    /// URL or image to bookmark.
    pub content: IngestContent,
    /// Title and summary source.
    pub mode: SummaryMode,
    /// Free-text notes, passed through unchanged.
    pub notes: Option<String>,
}

impl IngestForm {
    /// Validate the form. Checks run in a fixed order and the first failure wins: manual
    /// fields, then the field required by the declared kind, then the kind itself.
    pub fn validate(self, today: Date) -> Result<IngestRequest, ValidationError> {
        let title = non_blank(self.title);
        let summary = non_blank(self.summary);

        let mode = if self.auto_generate.unwrap_or(true) {
            SummaryMode::Auto { title, summary }
        } else {
            SummaryMode::Manual {
                title: title.ok_or(ValidationError::MissingTitle)?,
                summary: summary.ok_or(ValidationError::MissingSummary)?,
            }
        };

        let content = match self.kind.as_deref().map(str::trim) {
            Some("url") => {
                let raw = non_blank(self.url).ok_or(ValidationError::MissingUrl)?;
                IngestContent::Url(parse_http_url(raw.trim())?)
            }
            Some("image") => {
                let payload = self.image.ok_or(ValidationError::MissingImage)?;
                let bytes = match payload.data {
                    ImageData::Raw(bytes) => bytes,
                    ImageData::Base64(encoded) => decode_base64(&encoded)?,
                };
                if bytes.is_empty() {
                    return Err(ValidationError::MissingImage);
                }
                IngestContent::Image(ImageFile::from_upload(
                    bytes,
                    payload.filename.as_deref(),
                    today,
                ))
            }
            _ => return Err(ValidationError::InvalidKind),
        };

        Ok(IngestRequest {
            content,
            mode,
            notes: self.notes,
        })
    }
}

/// Keep the caller's value as sent unless it is blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_http_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ValidationError::InvalidUrl),
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, ValidationError> {
    let data = match encoded.split_once(";base64,") {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => encoded,
    };
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|_| ValidationError::InvalidImageData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 10 - 18);

    fn url_form() -> IngestForm {
        IngestForm {
            kind: Some("url".into()),
            url: Some("https://example.com/post".into()),
            ..IngestForm::default()
        }
    }

    fn image_form(data: ImageData) -> IngestForm {
        IngestForm {
            kind: Some("image".into()),
            image: Some(ImagePayload {
                data,
                filename: None,
            }),
            ..IngestForm::default()
        }
    }

    #[test]
    fn auto_generate_defaults_to_true() {
        let request = url_form().validate(TODAY).expect("valid");
        assert_eq!(
            request.mode,
            SummaryMode::Auto {
                title: None,
                summary: None
            }
        );
        assert_eq!(request.content.kind(), "url");
    }

    #[test]
    fn manual_mode_requires_title_then_summary() {
        let mut form = url_form();
        form.auto_generate = Some(false);
        form.summary = Some("A summary".into());
        form.title = Some("   ".into());
        assert_eq!(form.clone().validate(TODAY), Err(ValidationError::MissingTitle));

        form.title = Some("Title".into());
        form.summary = None;
        assert_eq!(form.validate(TODAY), Err(ValidationError::MissingSummary));
    }

    #[test]
    fn manual_fields_are_checked_before_kind() {
        let form = IngestForm {
            kind: Some("video".into()),
            auto_generate: Some(false),
            ..IngestForm::default()
        };
        assert_eq!(form.validate(TODAY), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn manual_values_pass_through_unchanged() {
        let mut form = url_form();
        form.auto_generate = Some(false);
        form.title = Some("  Padded Title  ".into());
        form.summary = Some("Line one\n".into());
        let request = form.validate(TODAY).expect("valid");
        assert_eq!(
            request.mode,
            SummaryMode::Manual {
                title: "  Padded Title  ".into(),
                summary: "Line one\n".into()
            }
        );
    }

    #[test]
    fn url_is_trimmed_before_parsing() {
        let mut form = url_form();
        form.url = Some("  https://example.com/post \n".into());
        let request = form.validate(TODAY).expect("valid");
        assert!(
            matches!(request.content, IngestContent::Url(url) if url.as_str() == "https://example.com/post")
        );
    }

    #[test]
    fn url_kind_requires_absolute_http_url() {
        let mut form = url_form();
        form.url = None;
        assert_eq!(form.clone().validate(TODAY), Err(ValidationError::MissingUrl));

        form.url = Some("example.com".into());
        assert_eq!(form.clone().validate(TODAY), Err(ValidationError::InvalidUrl));

        form.url = Some("ftp://example.com/file".into());
        assert_eq!(form.validate(TODAY), Err(ValidationError::InvalidUrl));
    }

    #[test]
    fn unknown_or_missing_kind_is_rejected() {
        let mut form = url_form();
        form.kind = Some("video".into());
        assert_eq!(form.clone().validate(TODAY), Err(ValidationError::InvalidKind));
        form.kind = None;
        assert_eq!(form.validate(TODAY), Err(ValidationError::InvalidKind));
    }

    #[test]
    fn image_kind_decodes_base64_with_dated_default_name() {
        let request = image_form(ImageData::Base64("iVBORw0KGgo=".into()))
            .validate(TODAY)
            .expect("valid");
        match request.content {
            IngestContent::Image(file) => {
                assert_eq!(file.filename, "temp_2026-10-18.png");
                assert_eq!(file.mime_type, "image/png");
                assert_eq!(&file.bytes[1..4], b"PNG");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn image_kind_accepts_data_url_prefix() {
        let request = image_form(ImageData::Base64("data:image/png;base64,AQID".into()))
            .validate(TODAY)
            .expect("valid");
        assert!(matches!(request.content, IngestContent::Image(file) if file.bytes == vec![1, 2, 3]));
    }

    #[test]
    fn image_kind_rejects_missing_or_invalid_data() {
        let mut form = image_form(ImageData::Raw(Vec::new()));
        assert_eq!(form.clone().validate(TODAY), Err(ValidationError::MissingImage));

        form.image = None;
        assert_eq!(form.validate(TODAY), Err(ValidationError::MissingImage));

        assert_eq!(
            image_form(ImageData::Base64("not base64!".into())).validate(TODAY),
            Err(ValidationError::InvalidImageData)
        );
    }

    #[test]
    fn json_body_maps_thoughts_to_notes() {
        let body: JsonIngestBody = serde_json::from_str(
            r#"{"type":"image","data_b64":"AQID","filename":"a.jpg","thoughts":"keep","autoGenerate":false}"#,
        )
        .expect("json");
        let form = IngestForm::from(body);
        assert_eq!(form.notes.as_deref(), Some("keep"));
        assert_eq!(form.auto_generate, Some(false));
        assert_eq!(
            form.image.and_then(|image| image.filename).as_deref(),
            Some("a.jpg")
        );
    }
}

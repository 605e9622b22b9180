//! Data model shared by the pipeline stages: image files, summaries, upload handles, and the
//! bookmark page that is finally committed to Notion.

use time::Date;

/// MIME type attached to every uploaded screenshot.
pub const SCREENSHOT_MIME_TYPE: &str = "image/png";

/// Binary image received from a client, normalized for upload and summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name sent to the document store; always carries an extension.
    pub filename: String,
    /// MIME type reported to the document store and the LLM.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wrap client-supplied bytes, deriving a dated default name when none was given.
    ///
    /// Missing or blank names become `temp_YYYY-MM-DD.png`; names without an extension get
    /// `.png` appended. The MIME type is always [`SCREENSHOT_MIME_TYPE`].
    pub fn from_upload(bytes: Vec<u8>, filename: Option<&str>, today: Date) -> Self {
        let mut filename = match filename.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "temp_{:04}-{:02}-{:02}.png",
                today.year(),
                u8::from(today.month()),
                today.day()
            ),
        };

        if !has_extension(&filename) {
            filename.push_str(".png");
        }

        Self {
            filename,
            mime_type: SCREENSHOT_MIME_TYPE.to_string(),
            bytes,
        }
    }
}

fn has_extension(filename: &str) -> bool {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) => idx + 1 < base.len(),
        None => false,
    }
}

/// Title and summary pair attached to a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSummary {
    /// Short title, ideally at most ten words.
    pub title: String,
    /// Short summary, roughly fifty words.
    pub summary: String,
    /// Set when the summarizer fell back to a placeholder instead of model output.
    pub degraded: bool,
}

impl ContentSummary {
    /// Summary produced by a model or supplied by the caller.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            degraded: false,
        }
    }

    /// Placeholder summary describing why generation did not happen.
    pub fn placeholder(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            degraded: true,
        }
    }

    /// Prefer caller-supplied values over generated ones, field by field.
    pub fn with_overrides(mut self, title: Option<String>, summary: Option<String>) -> Self {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(summary) = summary {
            self.summary = summary;
        }
        self
    }
}

/// Opaque identifier of a file accepted by the document store but not yet attached to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHandle(String);

impl UploadHandle {
    /// Wrap the identifier returned by the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Origin of a bookmark, reflected in the page tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkSource {
    /// Saved from a web address.
    Url,
    /// Saved from an uploaded image.
    Screenshot,
}

impl BookmarkSource {
    /// Tag written to the `Tags` multi-select property.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Url => "Website",
            Self::Screenshot => "Screenshot",
        }
    }

    /// Lowercase label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Screenshot => "screenshot",
        }
    }
}

/// Bookmark record handed to the page committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkPage {
    /// Page title.
    pub title: String,
    /// Summary paragraph.
    pub summary: String,
    /// Where the bookmark came from.
    pub source: BookmarkSource,
    /// Bookmarked address, rendered as a bookmark block.
    pub url: Option<String>,
    /// Uploaded screenshot, rendered as an image block.
    pub upload: Option<UploadHandle>,
    /// Free-text notes from the user.
    pub notes: Option<String>,
}

/// Confirmation returned by the store after a page was created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Identifier of the created page, when reported.
    pub page_id: Option<String>,
    /// Public URL of the created page, when reported.
    pub page_url: Option<String>,
}

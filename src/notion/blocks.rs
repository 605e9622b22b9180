//! Page payload construction.
//!
//! Block order is fixed by [`LayoutStage`], not by the order in which sections are filled in:
//! link, media, summary, notes.

use crate::bookmark::{BookmarkPage, BookmarkSource, UploadHandle};
use serde_json::{Value, json};

/// Maximum characters Notion accepts in a single rich-text item.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Heading placed above the summary paragraph.
pub const SUMMARY_HEADING: &str = "Summary:";
/// Heading placed above the user's notes.
pub const NOTES_HEADING: &str = "My Thoughts:";
/// Paragraph rendered when a screenshot bookmark has no uploaded file.
pub const MISSING_IMAGE_TEXT: &str = "[Screenshot image not available (no uploadId)]";

/// Named sections of a bookmark page, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStage {
    /// Bookmark block pointing at the saved URL.
    Link,
    /// Uploaded screenshot or its placeholder.
    Media,
    /// Summary heading and paragraph.
    Summary,
    /// Notes heading and paragraph.
    Notes,
}

impl LayoutStage {
    /// Rendering order of every stage.
    pub const ORDER: [LayoutStage; 4] = [Self::Link, Self::Media, Self::Summary, Self::Notes];

    fn slot(self) -> usize {
        match self {
            Self::Link => 0,
            Self::Media => 1,
            Self::Summary => 2,
            Self::Notes => 3,
        }
    }
}

/// Collects blocks per stage and flattens them in [`LayoutStage::ORDER`].
#[derive(Debug, Default, Clone)]
pub struct PageLayout {
    stages: [Vec<Value>; 4],
}

impl PageLayout {
    /// Empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bookmark block for `url`.
    pub fn link(mut self, url: &str) -> Self {
        self.set(
            LayoutStage::Link,
            vec![json!({
                "object": "block",
                "type": "bookmark",
                "bookmark": { "url": url },
            })],
        );
        self
    }

    /// Add the uploaded image, or a placeholder paragraph when no upload is available.
    pub fn media(mut self, upload: Option<&UploadHandle>) -> Self {
        let block = match upload {
            Some(handle) => json!({
                "object": "block",
                "type": "image",
                "image": {
                    "type": "file_upload",
                    "file_upload": { "id": handle.as_str() },
                },
            }),
            None => paragraph(MISSING_IMAGE_TEXT),
        };
        self.set(LayoutStage::Media, vec![block]);
        self
    }

    /// Add the summary section.
    pub fn summary(mut self, summary: &str) -> Self {
        self.set(
            LayoutStage::Summary,
            vec![heading(SUMMARY_HEADING), paragraph(summary)],
        );
        self
    }

    /// Add the notes section.
    pub fn notes(mut self, notes: &str) -> Self {
        self.set(
            LayoutStage::Notes,
            vec![heading(NOTES_HEADING), paragraph(notes)],
        );
        self
    }

    /// Flatten all stages into the page's `children` array.
    pub fn into_blocks(self) -> Vec<Value> {
        let mut stages = self.stages;
        LayoutStage::ORDER
            .iter()
            .flat_map(|stage| std::mem::take(&mut stages[stage.slot()]))
            .collect()
    }

    fn set(&mut self, stage: LayoutStage, blocks: Vec<Value>) {
        self.stages[stage.slot()] = blocks;
    }
}

/// Build the block list for a bookmark.
pub fn layout_for(page: &BookmarkPage) -> PageLayout {
    let mut layout = PageLayout::new();
    if let Some(url) = page.url.as_deref() {
        layout = layout.link(url);
    }
    if page.source == BookmarkSource::Screenshot {
        layout = layout.media(page.upload.as_ref());
    }
    if !page.summary.trim().is_empty() {
        layout = layout.summary(&page.summary);
    }
    if let Some(notes) = page.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
        layout = layout.notes(notes);
    }
    layout
}

/// Build the complete `POST /pages` payload for a bookmark.
pub fn build_page_payload(page: &BookmarkPage, database_id: &str) -> Value {
    let mut payload = json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Title": { "title": rich_text(&page.title) },
            "Tags": { "multi_select": [ { "name": page.source.tag() } ] },
        },
    });

    let children = layout_for(page).into_blocks();
    if !children.is_empty()
        && let Some(object) = payload.as_object_mut()
    {
        object.insert("children".into(), Value::Array(children));
    }

    payload
}

/// Split text into rich-text items that respect [`RICH_TEXT_LIMIT`].
pub fn rich_text(content: &str) -> Vec<Value> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![text_item("")];
    }
    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| text_item(&chunk.iter().collect::<String>()))
        .collect()
}

fn text_item(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

fn heading(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": { "rich_text": rich_text(text) },
    })
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": rich_text(text) },
    })
}

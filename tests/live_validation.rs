use instant_bookmark::{
    bookmark::{ContentSummary, ImageFile},
    config::{self, Config},
    extractor::get_content_extractor,
    ingest::{IngestForm, IngestService},
    summarization::{ContentSummarizer, LlmSummarizer},
};
use time::OffsetDateTime;

fn live_config() -> Config {
    config::load().expect("live tests need API_ACCESS_KEY, NOTION_API_KEY and NOTION_DATABASE_ID")
}

// 1x1 transparent PNG.
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[tokio::test]
#[ignore = "Requires a live browser backend"]
async fn live_extraction_returns_page_text() {
    let config = live_config();
    let extractor = get_content_extractor(&config).expect("extractor");
    let text = extractor
        .extract("https://example.com")
        .await
        .expect("failed to extract page text");
    assert!(
        text.contains("Example Domain"),
        "unexpected page text: {text}"
    );
}

#[tokio::test]
#[ignore = "Requires a live OpenAI-compatible provider"]
async fn live_summary_is_not_degraded() {
    let config = live_config();
    assert!(config.openai_api_key.is_some(), "OPENAI_API_KEY must be set");
    let summarizer = LlmSummarizer::from_config(&config);
    let summary: ContentSummary = summarizer
        .summarize_text("Rust is a systems programming language focused on safety and speed.")
        .await;
    assert!(!summary.degraded, "summary degraded: {summary:?}");
    assert!(!summary.title.is_empty());
}

#[tokio::test]
#[ignore = "Requires a live Notion database; creates a page"]
async fn live_screenshot_bookmark_is_committed() {
    let config = live_config();
    let service = IngestService::from_config(&config).expect("service");
    let today = OffsetDateTime::now_utc().date();
    let image = ImageFile::from_upload(TINY_PNG.to_vec(), Some("live-validation"), today);

    let form = IngestForm {
        kind: Some("image".into()),
        image: Some(instant_bookmark::ingest::ImagePayload {
            data: instant_bookmark::ingest::ImageData::Raw(image.bytes),
            filename: Some(image.filename),
        }),
        auto_generate: Some(false),
        title: Some("Instant Bookmark live validation".into()),
        summary: Some("Created by the ignored live validation test.".into()),
        notes: Some("Safe to delete.".into()),
        ..IngestForm::default()
    };

    let receipt = service
        .ingest(form.validate(today).expect("valid form"))
        .await
        .expect("failed to create bookmark page");
    assert!(receipt.page_id.is_some(), "Notion did not report a page id");
}

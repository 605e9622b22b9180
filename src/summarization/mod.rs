//! Title and summary generation for extracted page text and screenshots.
//!
//! The summarizer never fails from the caller's point of view. A missing API key, an
//! unreachable provider, an error status, or an unusable reply all turn into a placeholder
//! [`ContentSummary`] whose text explains what went wrong, so the bookmark can still be saved.

pub mod openai;

use crate::bookmark::{ContentSummary, ImageFile};
use crate::config::Config;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::json;

pub use openai::{GeneratedSummary, OpenAiClient, SummarizationClientError, SummaryPrompt};

/// Longest text, in characters, forwarded to the model.
pub const MAX_TEXT_CHARS: usize = 12_000;
/// Largest image, in bytes, forwarded to the model.
pub const MAX_IMAGE_BYTES: usize = 12_000_000;

const TEXT_MAX_TOKENS: u32 = 200;
const IMAGE_MAX_TOKENS: u32 = 150;

const TEXT_SYSTEM_PROMPT: &str = "You are an AI assistant. You are given the text of a web page \
and must produce a title and summary for it. Reply ONLY with a JSON object that has two keys: \
'title' (string, concise, max 10 words) and 'summary' (string, roughly 50 words). Focus on the \
main content. If the page already has a title, use it. Use the original language of the text.";

const IMAGE_SYSTEM_PROMPT: &str = "You are an AI assistant. Reply ONLY with a JSON object that \
has two keys: 'title' (string, concise, max 10 words) and 'summary' (string, short, max 50 \
words). If the image is a screenshot of a web page or document that shows a title, use it. Use \
the original language of the image if it contains text.";

const IMAGE_USER_PROMPT: &str =
    "Analyze this image and provide a title and summary based on its content.";

/// Produces a title and summary for extracted text or an uploaded image.
#[async_trait]
pub trait ContentSummarizer: Send + Sync {
    /// Summarize page text.
    async fn summarize_text(&self, text: &str) -> ContentSummary;

    /// Summarize an image.
    async fn summarize_image(&self, image: &ImageFile) -> ContentSummary;
}

#[derive(Debug, Clone, Copy)]
enum Subject {
    Text,
    Image,
}

impl Subject {
    fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    fn missing_key(self) -> ContentSummary {
        match self {
            Self::Text => ContentSummary::placeholder(
                "Summarized Text Title (Dummy - OpenAI Key Missing)",
                "This is a dummy summary of the extracted text because the OpenAI API key is \
                 not configured.",
            ),
            Self::Image => ContentSummary::placeholder(
                "Processed Screenshot Title (Dummy - OpenAI Key Missing)",
                "This is a dummy summary for the screenshot because the OpenAI API key is not \
                 configured.",
            ),
        }
    }

    fn failed(self, error: &SummarizationClientError) -> ContentSummary {
        let base = match self {
            Self::Text => "Text Summarization Failed",
            Self::Image => "Content Generation Failed",
        };
        match error {
            SummarizationClientError::Api { status, message } => ContentSummary::placeholder(
                format!("{base} (API Error {})", status.as_u16()),
                format!("The summarization provider returned an error: {message}"),
            ),
            other => ContentSummary::placeholder(
                base,
                format!("Could not generate a summary: {other}"),
            ),
        }
    }
}

/// Summarizer backed by an OpenAI-compatible chat completion API.
pub struct LlmSummarizer {
    client: Option<OpenAiClient>,
}

impl LlmSummarizer {
    /// Wrap an existing client. `None` puts the summarizer in placeholder mode.
    pub fn new(client: Option<OpenAiClient>) -> Self {
        Self { client }
    }

    /// Build from configuration; placeholder mode when no API key is configured.
    pub fn from_config(config: &Config) -> Self {
        let client = config.openai_api_key.as_ref().and_then(|key| {
            match OpenAiClient::new(
                config.openai_base_url.clone(),
                key.clone(),
                config.openai_model.clone(),
            ) {
                Ok(client) => Some(client),
                Err(error) => {
                    tracing::warn!(%error, "Summarization client unavailable; using placeholders");
                    None
                }
            }
        });
        if client.is_none() {
            tracing::info!("OPENAI_API_KEY not configured; summaries will be placeholders");
        }
        Self { client }
    }

    async fn run(
        &self,
        subject: Subject,
        prompt: Result<SummaryPrompt, SummarizationClientError>,
    ) -> ContentSummary {
        let Some(client) = self.client.as_ref() else {
            tracing::warn!(subject = subject.label(), "Summarizer has no API key");
            return subject.missing_key();
        };

        let outcome = match prompt {
            Ok(prompt) => client.generate(prompt).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(generated) => {
                tracing::debug!(
                    subject = subject.label(),
                    model = client.model(),
                    title = %generated.title,
                    "Summary generated"
                );
                ContentSummary::new(generated.title, generated.summary)
            }
            Err(error) => {
                tracing::warn!(subject = subject.label(), %error, "Summarization degraded");
                subject.failed(&error)
            }
        }
    }
}

#[async_trait]
impl ContentSummarizer for LlmSummarizer {
    async fn summarize_text(&self, text: &str) -> ContentSummary {
        let prompt = Ok(SummaryPrompt {
            system: TEXT_SYSTEM_PROMPT,
            user: json!(truncate_chars(text, MAX_TEXT_CHARS)),
            max_tokens: TEXT_MAX_TOKENS,
        });
        self.run(Subject::Text, prompt).await
    }

    async fn summarize_image(&self, image: &ImageFile) -> ContentSummary {
        self.run(Subject::Image, image_prompt(image)).await
    }
}

fn image_prompt(image: &ImageFile) -> Result<SummaryPrompt, SummarizationClientError> {
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(SummarizationClientError::InvalidInput(format!(
            "image is {} bytes; the limit is {MAX_IMAGE_BYTES}",
            image.bytes.len()
        )));
    }
    let data_url = format!(
        "data:{};base64,{}",
        image.mime_type,
        STANDARD.encode(&image.bytes)
    );
    Ok(SummaryPrompt {
        system: IMAGE_SYSTEM_PROMPT,
        user: json!([
            { "type": "text", "text": IMAGE_USER_PROMPT },
            { "type": "image_url", "image_url": { "url": data_url, "detail": "low" } },
        ]),
        max_tokens: IMAGE_MAX_TOKENS,
    })
}

/// Return at most `limit` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

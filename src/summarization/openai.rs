//! OpenAI-compatible chat completion client that asks for a JSON `{title, summary}` object.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors surfaced while requesting a title and summary from the provider.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider could not be reached or the client could not be built.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider answered with a non-success status.
    #[error("Provider returned {status}: {message}")]
    Api {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Error message extracted from the response body.
        message: String,
    },
    /// Provider response could not be parsed or lacked a field.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Input was rejected before contacting the provider.
    #[error("Input rejected: {0}")]
    InvalidInput(String),
}

/// Single chat completion request assembled by the summarizer.
#[derive(Debug, Clone)]
pub struct SummaryPrompt {
    /// System instructions describing the expected JSON object.
    pub system: &'static str,
    /// User message; either a plain string or an array of content parts.
    pub user: Value,
    /// Completion token budget.
    pub max_tokens: u32,
}

/// Title and summary parsed from the model's JSON reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSummary {
    /// Generated title.
    pub title: String,
    /// Generated summary.
    pub summary: String,
}

/// Minimal client for `POST {base}/chat/completions`.
pub struct OpenAiClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

impl OpenAiClient {
    /// Build a client for the given provider.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("instant-bookmark/summary")
            .build()
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Request a completion and parse the `{title, summary}` object it must contain.
    pub async fn generate(
        &self,
        prompt: SummaryPrompt,
    ) -> Result<GeneratedSummary, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "max_tokens": prompt.max_tokens,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::Api {
                status,
                message: provider_error_message(&body).unwrap_or(body),
            });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode chat completion: {error}"
            ))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse("no message content".into())
            })?;

        parse_generated(&content)
    }
}

/// Parse the model's JSON reply, requiring non-empty `title` and `summary` strings.
pub(crate) fn parse_generated(content: &str) -> Result<GeneratedSummary, SummarizationClientError> {
    let parsed: ModelReply = serde_json::from_str(content.trim()).map_err(|error| {
        SummarizationClientError::InvalidResponse(format!("content is not a JSON object: {error}"))
    })?;

    let title = parsed.title.map(|title| title.trim().to_string());
    let summary = parsed.summary.map(|summary| summary.trim().to_string());
    match (title, summary) {
        (Some(title), Some(summary)) if !title.is_empty() && !summary.is_empty() => {
            Ok(GeneratedSummary { title, summary })
        }
        _ => Err(SummarizationClientError::InvalidResponse(
            "response JSON is missing title or summary".into(),
        )),
    }
}

fn provider_error_message(body: &str) -> Option<String> {
    let parsed: ProviderErrorBody = serde_json::from_str(body).ok()?;
    parsed.error.message.filter(|message| !message.is_empty())
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    pub(crate) fn test_client(base_url: String) -> OpenAiClient {
        OpenAiClient {
            http: Client::builder()
                .user_agent("instant-bookmark-test")
                .build()
                .expect("client"),
            base_url,
            api_key: "sk-test".into(),
            model: "gpt-4.1-nano".into(),
        }
    }

    fn prompt() -> SummaryPrompt {
        SummaryPrompt {
            system: "Reply with JSON",
            user: json!("Page text"),
            max_tokens: 200,
        }
    }

    #[tokio::test]
    async fn parses_json_object_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(
                        r#"{ "model": "gpt-4.1-nano", "response_format": { "type": "json_object" }, "max_tokens": 200 }"#,
                    );
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "{\"title\":\"Rust 2024\",\"summary\":\"Edition notes.\"}" } }
                    ]
                }));
            })
            .await;

        let generated = test_client(server.base_url())
            .generate(prompt())
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(
            generated,
            GeneratedSummary {
                title: "Rust 2024".into(),
                summary: "Edition notes.".into()
            }
        );
    }

    #[tokio::test]
    async fn error_status_carries_provider_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429)
                    .json_body(json!({ "error": { "message": "Rate limit reached" } }));
            })
            .await;

        let error = test_client(server.base_url())
            .generate(prompt())
            .await
            .expect_err("error status");

        match error {
            SummarizationClientError::Api { status, message } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = test_client(server.base_url())
            .generate(prompt())
            .await
            .expect_err("no content");

        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[test]
    fn reply_must_contain_both_fields() {
        assert!(parse_generated(r#"{"title":"Only title"}"#).is_err());
        assert!(parse_generated(r#"{"title":"","summary":"x"}"#).is_err());
        assert!(parse_generated("not json").is_err());
        let parsed = parse_generated(" {\"title\":\" T \",\"summary\":\"S\"} ").expect("parsed");
        assert_eq!(parsed.title, "T");
    }
}

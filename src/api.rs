//! HTTP surface for Instant Bookmark.
//!
//! One endpoint accepts bookmark submissions, mounted at two paths:
//!
//! - `POST /ingest`
//! - `POST /api/ingest` – legacy path used by older clients.
//!
//! Requests must carry the shared secret in `X-API-Key`. Bodies are either JSON
//! (`{type, url, data_b64, filename, thoughts, autoGenerate, title, summary}`) or a multipart
//! form with a binary `file` field. Every response is the envelope `{ok, error?}`.
//!
//! Checks run in a fixed order: method, key, content type and body, then field validation.
//! Failures in the pipeline itself are reported with status 500.

use crate::ingest::{
    IngestError, IngestForm, IngestRequest, IngestService, JsonIngestBody, ValidationError,
};
use crate::ingest::{ImageData, ImagePayload};
use crate::logging::ingest_span;
use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::Instrument;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared state handed to the ingestion handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<IngestService>,
    access_key: Arc<str>,
}

impl AppState {
    /// Pair the pipeline with the key clients must present.
    pub fn new(service: IngestService, access_key: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            access_key: access_key.into(),
        }
    }
}

/// Build the HTTP router exposing the ingestion endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", any(ingest))
        .route("/api/ingest", any(ingest))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Response envelope shared by every outcome.
#[derive(Debug, Serialize)]
struct Envelope {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn ingest(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let span = ingest_span();
    async move {
        let ingest_request = admit(request, &state.access_key)
            .await
            .inspect_err(|error| tracing::warn!(?error, "Rejected ingestion request"))?;
        tracing::Span::current().record("kind", ingest_request.content.kind());

        tracing::info!("Ingestion started");
        let receipt = state.service.ingest(ingest_request).await.map_err(|error| {
            tracing::error!(%error, "Ingestion failed");
            ApiError::Pipeline(error)
        })?;
        tracing::info!(
            page_id = receipt.page_id.as_deref().unwrap_or("unknown"),
            "Ingestion completed"
        );
        Ok::<_, ApiError>(
            Json(Envelope {
                ok: true,
                error: None,
            })
            .into_response(),
        )
    }
    .instrument(span)
    .await
}

/// Request checks in their fixed order: method, key, body, fields.
async fn admit(request: Request, access_key: &str) -> Result<IngestRequest, ApiError> {
    if request.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }
    authorize(request.headers(), access_key)?;

    let form = read_form(request).await?;
    let today = OffsetDateTime::now_utc().date();
    Ok(form.validate(today)?)
}

fn authorize(headers: &HeaderMap, access_key: &str) -> Result<(), ApiError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match provided {
        Some(key) if !access_key.is_empty() && key == access_key => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

async fn read_form(request: Request) -> Result<IngestForm, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        read_json(request.into_body()).await
    } else if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        read_multipart(multipart).await
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

async fn read_json(body: Body) -> Result<IngestForm, ApiError> {
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::BadRequest("Invalid JSON".into()))?;
    let parsed: JsonIngestBody = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".into()))?;
    Ok(parsed.into())
}

async fn read_multipart(mut multipart: Multipart) -> Result<IngestForm, ApiError> {
    let invalid = |error: axum::extract::multipart::MultipartError| {
        ApiError::BadRequest(format!("Invalid multipart form: {}", error.body_text()))
    };

    let mut form = IngestForm::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(invalid)?;
                form.image = Some(ImagePayload {
                    data: ImageData::Raw(bytes.to_vec()),
                    filename,
                });
            }
            "autoGenerate" => {
                let value = field.text().await.map_err(invalid)?;
                form.auto_generate = Some(parse_flag(&value)?);
            }
            "manualTitle" | "title" => form.title = Some(field.text().await.map_err(invalid)?),
            "manualSummary" | "summary" => {
                form.summary = Some(field.text().await.map_err(invalid)?)
            }
            "thoughts" | "notes" => form.notes = Some(field.text().await.map_err(invalid)?),
            "url" => form.url = Some(field.text().await.map_err(invalid)?),
            "type" => form.kind = Some(field.text().await.map_err(invalid)?),
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    if form.kind.is_none() {
        form.kind = if form.image.is_some() {
            Some("image".into())
        } else if form.url.is_some() {
            Some("url".into())
        } else {
            None
        };
    }
    Ok(form)
}

fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ApiError::BadRequest(
            "autoGenerate must be \"true\" or \"false\"".into(),
        )),
    }
}

/// Request-level failures and the status each maps to.
#[derive(Debug)]
enum ApiError {
    MethodNotAllowed,
    Unauthorized,
    UnsupportedMediaType,
    BadRequest(String),
    Pipeline(IngestError),
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            Self::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported content type".into(),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Pipeline(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };
        let mut response = (
            status,
            Json(Envelope {
                ok: false,
                error: Some(message),
            }),
        )
            .into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

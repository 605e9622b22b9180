//! Playwright MCP backend: spawns an MCP server over stdio and drives it with tool calls.

use super::{ContentExtractor, ExtractionError, non_empty};
use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    handler::client::ClientHandler,
    model::{CallToolRequestParam, CallToolResult, ClientInfo},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::{
    process::Command,
    time::{Instant, timeout, timeout_at},
};

const WAIT_SECONDS: u64 = 2;
/// Longest wait for the MCP server to shut down once a session ends.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Default)]
struct BrowserClient;

impl ClientHandler for BrowserClient {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

type BrowserSession = RunningService<RoleClient, BrowserClient>;

/// Extractor that launches a Playwright MCP server for each request.
pub struct PlaywrightMcpExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PlaywrightMcpExtractor {
    /// Spawn `program args..` per extraction. Startup and tool calls share one `timeout`.
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }

    async fn connect(&self) -> Result<BrowserSession, ExtractionError> {
        let args = self.args.clone();
        let transport = TokioChildProcess::new(Command::new(&self.program).configure(|cmd| {
            cmd.args(&args);
        }))
        .map_err(|error| ExtractionError::Session(format!("{}: {error}", self.program)))?;

        BrowserClient
            .serve(transport)
            .await
            .map_err(|error| ExtractionError::Session(error.to_string()))
    }
}

#[async_trait]
impl ContentExtractor for PlaywrightMcpExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractionError> {
        tracing::debug!(%url, program = %self.program, "Starting Playwright MCP session");
        let deadline = Instant::now() + self.timeout;
        let session = timeout_at(deadline, self.connect())
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))??;

        let outcome = timeout_at(deadline, snapshot_text(&session, url)).await;
        shutdown(session).await;

        let text = outcome.map_err(|_| ExtractionError::Timeout(self.timeout))??;
        tracing::debug!(%url, chars = text.chars().count(), "Playwright extraction complete");
        Ok(text)
    }
}

/// Stop the session. A server that ignores the request is killed when the transport drops.
async fn shutdown(session: BrowserSession) {
    match timeout(SHUTDOWN_GRACE, session.cancel()).await {
        Ok(Ok(_)) => {}
        Ok(Err(error)) => tracing::warn!(%error, "Failed to shut down Playwright MCP session"),
        Err(_) => tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Playwright MCP session did not shut down in time; dropping it"
        ),
    }
}

async fn snapshot_text(session: &BrowserSession, url: &str) -> Result<String, ExtractionError> {
    call(session, "browser_navigate", json!({ "url": url })).await?;
    call(session, "browser_wait_for", json!({ "time": WAIT_SECONDS })).await?;
    let snapshot = call(session, "browser_snapshot", json!({})).await?;
    first_text(&snapshot)
}

async fn call(
    session: &BrowserSession,
    tool: &'static str,
    arguments: Value,
) -> Result<CallToolResult, ExtractionError> {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let result = session
        .call_tool(CallToolRequestParam {
            name: tool.into(),
            arguments: Some(arguments),
        })
        .await
        .map_err(|error| ExtractionError::Backend(format!("{tool}: {error}")))?;

    if result.is_error == Some(true) {
        let detail = first_text(&result).unwrap_or_else(|_| "tool reported an error".into());
        return Err(ExtractionError::Backend(format!("{tool}: {detail}")));
    }
    Ok(result)
}

/// Text of the first content item in a tool result.
fn first_text(result: &CallToolResult) -> Result<String, ExtractionError> {
    let text = result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .ok_or(ExtractionError::EmptyResult)?;
    non_empty(text)
}

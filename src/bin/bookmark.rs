use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Parser)]
#[command(
    name = "bookmark",
    about = "Save a URL or a screenshot to Notion through an Instant Bookmark server"
)]
struct Cli {
    /// Ingestion endpoint of the server.
    #[arg(
        long,
        env = "BOOKMARK_ENDPOINT",
        default_value = "http://127.0.0.1:4100/ingest",
        global = true
    )]
    endpoint: String,
    /// Shared secret sent as `X-API-Key`.
    #[arg(long, env = "API_ACCESS_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bookmark a web page.
    Url {
        url: String,
        #[command(flatten)]
        annotation: Annotation,
    },
    /// Bookmark an image file.
    Image {
        path: PathBuf,
        #[command(flatten)]
        annotation: Annotation,
    },
}

#[derive(Args, Default)]
struct Annotation {
    /// Notes stored under "My Thoughts".
    #[arg(long)]
    thoughts: Option<String>,
    /// Title to use; together with --summary it disables generation.
    #[arg(long)]
    title: Option<String>,
    /// Summary to use; together with --title it disables generation.
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let Some(api_key) = cli.api_key.filter(|key| !key.trim().is_empty()) else {
        bail!("an API key is required (--api-key or API_ACCESS_KEY)");
    };

    let payload = match cli.command {
        Command::Url { url, annotation } => url_payload(&url, annotation),
        Command::Image { path, annotation } => image_payload(&path, annotation)?,
    };

    let response = reqwest::Client::new()
        .post(&cli.endpoint)
        .header("X-API-Key", api_key)
        .json(&payload)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", cli.endpoint))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read server response")?;
    println!("{body}");

    let envelope: Envelope = serde_json::from_str(&body)
        .with_context(|| format!("server answered {status} with a non-envelope body"))?;
    if !envelope.ok {
        bail!(
            "bookmark rejected ({status}): {}",
            envelope.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    Ok(())
}

fn url_payload(url: &str, annotation: Annotation) -> Value {
    let mut payload = Map::new();
    payload.insert("type".into(), json!("url"));
    payload.insert("url".into(), json!(url));
    annotate(&mut payload, annotation);
    Value::Object(payload)
}

fn image_payload(path: &Path, annotation: Annotation) -> Result<Value> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image at {}", path.display()))?;
    let mut payload = Map::new();
    payload.insert("type".into(), json!("image"));
    payload.insert("data_b64".into(), json!(STANDARD.encode(bytes)));
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        payload.insert("filename".into(), json!(name));
    }
    annotate(&mut payload, annotation);
    Ok(Value::Object(payload))
}

fn annotate(payload: &mut Map<String, Value>, annotation: Annotation) {
    let Annotation {
        thoughts,
        title,
        summary,
    } = annotation;
    let manual = title.is_some() && summary.is_some();
    payload.insert("autoGenerate".into(), json!(!manual));
    if let Some(thoughts) = thoughts {
        payload.insert("thoughts".into(), json!(thoughts));
    }
    if let Some(title) = title {
        payload.insert("title".into(), json!(title));
    }
    if let Some(summary) = summary {
        payload.insert("summary".into(), json!(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_payload_defaults_to_generation() {
        let payload = url_payload(
            "https://example.com",
            Annotation {
                thoughts: Some("later".into()),
                ..Annotation::default()
            },
        );
        assert_eq!(
            payload,
            json!({
                "type": "url",
                "url": "https://example.com",
                "autoGenerate": true,
                "thoughts": "later"
            })
        );
    }

    #[test]
    fn title_and_summary_select_manual_mode() {
        let payload = url_payload(
            "https://example.com",
            Annotation {
                title: Some("T".into()),
                summary: Some("S".into()),
                ..Annotation::default()
            },
        );
        assert_eq!(payload["autoGenerate"], false);

        let only_title = url_payload(
            "https://example.com",
            Annotation {
                title: Some("T".into()),
                ..Annotation::default()
            },
        );
        assert_eq!(only_title["autoGenerate"], true);
        assert_eq!(only_title["title"], "T");
    }

    #[test]
    fn image_payload_encodes_file() {
        let path = std::env::temp_dir().join(format!("bookmark-cli-{}.png", std::process::id()));
        fs::write(&path, [1u8, 2, 3]).expect("write temp image");

        let payload = image_payload(&path, Annotation::default()).expect("payload");
        fs::remove_file(&path).ok();

        assert_eq!(payload["type"], "image");
        assert_eq!(payload["data_b64"], "AQID");
        assert!(
            payload["filename"]
                .as_str()
                .is_some_and(|name| name.ends_with(".png"))
        );
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bookmark",
            "url",
            "https://example.com",
            "--api-key",
            "k",
            "--endpoint",
            "http://localhost:9000/ingest",
        ])
        .expect("parse");
        assert_eq!(cli.endpoint, "http://localhost:9000/ingest");
        assert_eq!(cli.api_key.as_deref(), Some("k"));
    }
}

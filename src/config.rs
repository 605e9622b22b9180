use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-nano";
const DEFAULT_PLAYWRIGHT_COMMAND: &str = "npx -y @playwright/mcp@latest --headless";
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 45;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the bookmark ingestion server.
///
/// Built once at startup and handed to each component by reference; nothing reads the
/// environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret clients must send in the `X-API-Key` header.
    pub api_access_key: String,
    /// Integration token used for every Notion request.
    pub notion_api_key: String,
    /// Database that receives committed bookmark pages.
    pub notion_database_id: String,
    /// Base URL of the Notion REST API.
    pub notion_base_url: String,
    /// Value sent in the `Notion-Version` header.
    pub notion_version: String,
    /// Optional OpenAI-compatible API key; summaries degrade to placeholders without it.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible provider.
    pub openai_base_url: String,
    /// Chat model used for title and summary generation.
    pub openai_model: String,
    /// Browser automation backend used to extract page text.
    pub browser_connection: BrowserConnection,
    /// Upper bound for a single extraction session.
    pub extraction_timeout: Duration,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Browser automation backends supported by the content extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserConnection {
    /// Hosted BrowserQL endpoint (full URL including any token query parameter).
    BrowserQl(String),
    /// Command line that launches a Playwright MCP server over stdio.
    PlaywrightMcp {
        /// Executable to spawn.
        program: String,
        /// Arguments passed to the executable.
        args: Vec<String>,
    },
}

impl Default for BrowserConnection {
    fn default() -> Self {
        DEFAULT_PLAYWRIGHT_COMMAND
            .parse()
            .unwrap_or_else(|()| Self::PlaywrightMcp {
                program: "npx".into(),
                args: Vec::new(),
            })
    }
}

impl BrowserConnection {
    /// Short backend name for logs; never includes the endpoint, which may carry a token.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrowserQl(_) => "browserql",
            Self::PlaywrightMcp { .. } => "playwright-mcp",
        }
    }
}

impl std::str::FromStr for BrowserConnection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::BrowserQl(trimmed.to_string()));
        }

        let mut parts = trimmed.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(())?;
        Ok(Self::PlaywrightMcp {
            program,
            args: parts.collect(),
        })
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup, performing validation along the way.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let browser_connection = match load_optional(&lookup, "BROWSER_CONNECTION")
            .or_else(|| load_optional(&lookup, "MCP_CONNECTION_STRING"))
        {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("BROWSER_CONNECTION".into()))?,
            None => BrowserConnection::default(),
        };

        let extraction_timeout = load_optional(&lookup, "EXTRACTION_TIMEOUT_SECS")
            .map(|value| match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(secs),
                _ => Err(ConfigError::InvalidValue("EXTRACTION_TIMEOUT_SECS".into())),
            })
            .transpose()?
            .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT_SECS);

        Ok(Self {
            api_access_key: load_required(&lookup, "API_ACCESS_KEY")?,
            notion_api_key: load_required(&lookup, "NOTION_API_KEY")?,
            notion_database_id: load_required(&lookup, "NOTION_DATABASE_ID")?,
            notion_base_url: load_optional(&lookup, "NOTION_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NOTION_BASE_URL.to_string()),
            notion_version: load_optional(&lookup, "NOTION_VERSION")
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            openai_api_key: load_optional(&lookup, "OPENAI_API_KEY"),
            openai_base_url: load_optional(&lookup, "OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: load_optional(&lookup, "OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            browser_connection,
            extraction_timeout: Duration::from_secs(extraction_timeout),
            server_port: load_optional(&lookup, "SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    load_optional(lookup, key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Load `.env` (when present) and build the configuration from the environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}

impl Config {
    /// Log the effective configuration without secrets.
    pub fn log_summary(&self) {
        tracing::debug!(
            notion_base_url = %self.notion_base_url,
            notion_version = %self.notion_version,
            openai_base_url = %self.openai_base_url,
            openai_model = %self.openai_model,
            has_openai_key = self.openai_api_key.is_some(),
            browser = self.browser_connection.kind(),
            extraction_timeout_secs = self.extraction_timeout.as_secs(),
            server_port = ?self.server_port,
            "Loaded configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("API_ACCESS_KEY", "secret"),
        ("NOTION_API_KEY", "ntn_test"),
        ("NOTION_DATABASE_ID", "db-123"),
    ];

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("config");
        assert_eq!(config.api_access_key, "secret");
        assert_eq!(config.notion_base_url, DEFAULT_NOTION_BASE_URL);
        assert_eq!(config.notion_version, "2022-06-28");
        assert_eq!(config.openai_model, "gpt-4.1-nano");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.extraction_timeout, Duration::from_secs(45));
        assert_eq!(config.server_port, None);
        assert_eq!(
            config.browser_connection,
            BrowserConnection::PlaywrightMcp {
                program: "npx".into(),
                args: vec![
                    "-y".into(),
                    "@playwright/mcp@latest".into(),
                    "--headless".into()
                ],
            }
        );
    }

    #[test]
    fn reports_missing_required_variable() {
        let error = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(error, ConfigError::MissingVariable(name) if name == "NOTION_DATABASE_ID"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("OPENAI_API_KEY", "   "));
        pairs[0] = ("API_ACCESS_KEY", " ");
        let error = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(error, ConfigError::MissingVariable(name) if name == "API_ACCESS_KEY"));
    }

    #[test]
    fn rejects_invalid_numeric_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SERVER_PORT", "eighty"));
        let error = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "SERVER_PORT"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXTRACTION_TIMEOUT_SECS", "0"));
        let error = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(
            matches!(error, ConfigError::InvalidValue(name) if name == "EXTRACTION_TIMEOUT_SECS")
        );
    }

    #[test]
    fn browser_connection_distinguishes_urls_from_commands() {
        let remote: BrowserConnection = "https://production-sfo.browserless.io/chromium/bql?token=t"
            .parse()
            .expect("url");
        assert!(matches!(remote, BrowserConnection::BrowserQl(url) if url.ends_with("token=t")));

        let local: BrowserConnection = "  node ./mcp/cli.js --headless ".parse().expect("command");
        assert_eq!(
            local,
            BrowserConnection::PlaywrightMcp {
                program: "node".into(),
                args: vec!["./mcp/cli.js".into(), "--headless".into()],
            }
        );

        assert!("   ".parse::<BrowserConnection>().is_err());
    }

    #[test]
    fn legacy_mcp_connection_variable_is_honored() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MCP_CONNECTION_STRING", "http://localhost:3000/bql"));
        let config = Config::from_lookup(lookup_from(&pairs)).expect("config");
        assert_eq!(
            config.browser_connection,
            BrowserConnection::BrowserQl("http://localhost:3000/bql".into())
        );
    }
}

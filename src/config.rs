use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Hostname used in the webhook URL when no public host is configured.
pub const PLACEHOLDER_HOST: &str = "your-worker";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Public hostname the platform should deliver updates to.
    #[serde(default)]
    pub public_host: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_telegram_api_base(),
            public_host: None,
        }
    }
}

impl TelegramConfig {
    /// The URL registered with `setWebhook`. Falls back to a placeholder host
    /// so a misconfigured deployment still produces a readable platform error.
    pub fn webhook_url(&self) -> String {
        let host = self
            .public_host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(PLACEHOLDER_HOST);
        format!("https://{host}/")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    #[serde(default)]
    pub sheet_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            api_key: String::new(),
            range: default_range(),
            api_base: default_sheets_api_base(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HttpConfig {
    /// Per-request timeout for outbound calls. Unset means calls wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build().context("Failed to build HTTP client")
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_range() -> String {
    "Sheet1!A:Z".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    /// Load from `path` if it exists, then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Config::default()
        };

        let config = config.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Overlay values from the process environment. Empty values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TELEGRAM_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("WORKER_URL") {
            self.telegram.public_host = Some(v);
        }
        if let Some(v) = get("SHEET_ID") {
            self.sheets.sheet_id = v;
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.sheets.api_key = v;
        }
        if let Some(v) = get("LISTEN_ADDR") {
            self.server.listen = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("telegram.bot_token is not set (config file or TELEGRAM_TOKEN)");
        }
        if self.sheets.sheet_id.is_empty() {
            anyhow::bail!("sheets.sheet_id is not set (config file or SHEET_ID)");
        }
        if self.sheets.api_key.is_empty() {
            anyhow::bail!("sheets.api_key is not set (config file or GOOGLE_API_KEY)");
        }
        Ok(())
    }
}

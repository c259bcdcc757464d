mod bot;
mod config;
mod format;
mod platform;
mod records;
mod server;
mod sheets;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Bot;
use crate::config::Config;
use crate::platform::telegram::TelegramClient;
use crate::server::AppState;
use crate::sheets::SheetsClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,resultbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Sheet: {} ({})", config.sheets.sheet_id, config.sheets.range);
    info!("  Webhook URL: {}", config.telegram.webhook_url());
    info!("  HTTP timeout: {:?}", config.http.timeout());

    let http = config.http.build_client()?;
    let source = Arc::new(SheetsClient::new(http.clone(), config.sheets.clone()));
    let telegram = Arc::new(TelegramClient::new(http, config.telegram.clone()));

    let state = AppState {
        bot: Arc::new(Bot::new(source, telegram.clone())),
        telegram,
    };

    info!("Bot is starting...");
    server::run(state, &config.server.listen).await?;

    Ok(())
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::platform::{ChatId, Messenger};

/// Telegram's legacy Markdown is the only markup the bot emits.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Debug, Serialize)]
struct SendChatActionRequest<'a> {
    chat_id: &'a ChatId,
    action: ChatAction,
}

/// Thin Bot API client: one HTTP call per operation, no retries.
pub struct TelegramClient {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn post<T: Serialize + ?Sized>(&self, method: &str, body: &T) -> Result<()> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {method} request to Telegram"))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram {} error ({}): {}", method, status, error_body);
        }
        Ok(())
    }

    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        debug!("sendMessage to chat {} ({} chars)", chat_id, text.len());
        self.post(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                parse_mode,
            },
        )
        .await
    }

    pub async fn send_chat_action(&self, chat_id: &ChatId, action: ChatAction) -> Result<()> {
        self.post("sendChatAction", &SendChatActionRequest { chat_id, action })
            .await
    }

    /// Point the bot's webhook at the configured public host and return the
    /// platform's JSON reply as-is, whether it reports success or not.
    pub async fn set_webhook(&self) -> Result<Value> {
        let webhook_url = self.config.webhook_url();
        info!("Registering webhook: {}", webhook_url);

        let response = self
            .client
            .get(self.method_url("setWebhook"))
            .query(&[("url", webhook_url.as_str())])
            .send()
            .await
            .context("Failed to send setWebhook request to Telegram")?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("Failed to parse setWebhook response")?;

        info!("setWebhook returned {}: {}", status, body);
        Ok(body)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        self.send_message(chat_id, text, Some(ParseMode::Markdown))
            .await
    }

    async fn send_typing(&self, chat_id: &ChatId) -> Result<()> {
        self.send_chat_action(chat_id, ChatAction::Typing).await
    }
}

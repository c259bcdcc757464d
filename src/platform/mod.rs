pub mod telegram;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat identifier as sent by the platform. Telegram uses integers, but the
/// value is passed back untouched so string ids round-trip as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Int(id) => write!(f, "{id}"),
            ChatId::Str(id) => write!(f, "{id}"),
        }
    }
}

/// An inbound webhook update. Only the fields the bot reads are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUpdate {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// Outbound side of a chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a Markdown-formatted text message.
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<()>;

    /// Show the "typing" indicator in the chat.
    async fn send_typing(&self, chat_id: &ChatId) -> Result<()>;
}

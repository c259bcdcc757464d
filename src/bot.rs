use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::format::format_result;
use crate::platform::{ChatId, ChatUpdate, Messenger};
use crate::records;
use crate::sheets::RecordSource;

pub const WELCOME_TEXT: &str = "🎓 Welcome to Student Results Bot!\n\n\
                                Send your admission number to check results.\n\
                                Example: 2024001";
pub const ERROR_TEXT: &str = "⚠️ Error processing request";

pub fn not_found_text(admission_no: &str) -> String {
    format!("❌ No student found with admission number: {admission_no}")
}

/// Shared application state: the record source and the outbound messenger.
pub struct Bot {
    source: Arc<dyn RecordSource>,
    messenger: Arc<dyn Messenger>,
}

impl Bot {
    pub fn new(source: Arc<dyn RecordSource>, messenger: Arc<dyn Messenger>) -> Self {
        Self { source, messenger }
    }

    /// React to one inbound update. Only `/start` and plain text are handled;
    /// other commands get no reply.
    pub async fn handle_update(&self, update: ChatUpdate) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };

        let chat_id = message.chat.id;
        let text = message.text.unwrap_or_default();

        info!("Message from chat {}: {}", chat_id, text);

        if text == "/start" {
            self.messenger.send_text(&chat_id, WELCOME_TEXT).await?;
            return Ok(());
        }

        if text.starts_with('/') {
            debug!("Ignoring command {} from chat {}", text, chat_id);
            return Ok(());
        }

        self.handle_admission(&chat_id, text.trim()).await
    }

    /// Look up one admission number and reply with the result. Any failure
    /// along the way turns into the generic error reply.
    pub async fn handle_admission(&self, chat_id: &ChatId, admission_no: &str) -> Result<()> {
        if let Err(e) = self.reply_with_record(chat_id, admission_no).await {
            error!("Error processing admission {}: {:#}", admission_no, e);
            self.messenger.send_text(chat_id, ERROR_TEXT).await?;
        }
        Ok(())
    }

    async fn reply_with_record(&self, chat_id: &ChatId, admission_no: &str) -> Result<()> {
        // Typing indicator is cosmetic; carry on without it.
        if let Err(e) = self.messenger.send_typing(chat_id).await {
            warn!("Failed to send typing indicator to chat {}: {:#}", chat_id, e);
        }

        match records::find_record(self.source.as_ref(), admission_no).await {
            Some(record) => {
                info!("Found record for admission {}", admission_no);
                self.messenger
                    .send_text(chat_id, &format_result(&record))
                    .await
            }
            None => {
                info!("No record for admission {}", admission_no);
                self.messenger
                    .send_text(chat_id, &not_found_text(admission_no))
                    .await
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::RecordGrid;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Text(ChatId, String),
        Typing(ChatId),
    }

    /// Records every outbound call. Text sends fail while `fail_text` is set.
    #[derive(Default)]
    pub struct RecordingMessenger {
        pub sent: Mutex<Vec<Sent>>,
        pub fail_typing: bool,
        pub fail_text: Mutex<bool>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<()> {
            let mut fail = self.fail_text.lock().await;
            if *fail {
                *fail = false;
                anyhow::bail!("sendMessage failed");
            }
            self.sent
                .lock()
                .await
                .push(Sent::Text(chat_id.clone(), text.to_string()));
            Ok(())
        }

        async fn send_typing(&self, chat_id: &ChatId) -> Result<()> {
            if self.fail_typing {
                anyhow::bail!("sendChatAction failed");
            }
            self.sent.lock().await.push(Sent::Typing(chat_id.clone()));
            Ok(())
        }
    }

    /// Serves a fixed grid and counts fetches; `None` simulates an outage.
    #[derive(Default)]
    pub struct StaticSource {
        pub grid: Option<RecordGrid>,
        pub fetches: Mutex<usize>,
    }

    impl StaticSource {
        pub fn with_rows(rows: &[&[&str]]) -> Self {
            Self {
                grid: Some(
                    rows.iter()
                        .map(|r| r.iter().map(|c| c.to_string()).collect())
                        .collect(),
                ),
                fetches: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch_grid(&self) -> Result<RecordGrid> {
            *self.fetches.lock().await += 1;
            match &self.grid {
                Some(grid) => Ok(grid.clone()),
                None => anyhow::bail!("sheets unavailable"),
            }
        }
    }

    fn sample_source() -> Arc<StaticSource> {
        Arc::new(StaticSource::with_rows(&[
            &["Roll", "Name", "Math"],
            &["1", "Alice", "90"],
        ]))
    }

    fn update(text: Option<&str>) -> ChatUpdate {
        let body = match text {
            Some(t) => serde_json::json!({"message": {"chat": {"id": 5}, "text": t}}),
            None => serde_json::json!({"message": {"chat": {"id": 5}}}),
        };
        serde_json::from_value(body).unwrap()
    }

    async fn texts(messenger: &RecordingMessenger) -> Vec<String> {
        messenger
            .sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Text(_, t) => Some(t.clone()),
                Sent::Typing(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_start_sends_welcome_without_lookup() {
        let source = sample_source();
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(source.clone(), messenger.clone());

        bot.handle_update(update(Some("/start"))).await.unwrap();

        assert_eq!(
            *messenger.sent.lock().await,
            vec![Sent::Text(ChatId::Int(5), WELCOME_TEXT.to_string())]
        );
        assert_eq!(*source.fetches.lock().await, 0);
    }

    #[tokio::test]
    async fn test_found_record_is_formatted() {
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(sample_source(), messenger.clone());

        bot.handle_update(update(Some("  1 "))).await.unwrap();

        let sent = messenger.sent.lock().await.clone();
        assert_eq!(sent[0], Sent::Typing(ChatId::Int(5)));
        let reply = texts(&messenger).await.remove(0);
        assert!(reply.contains("**Name**: Alice"));
        assert!(reply.contains("**Math**: 90"));
    }

    #[tokio::test]
    async fn test_unknown_key_reports_not_found() {
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(sample_source(), messenger.clone());

        bot.handle_update(update(Some("2"))).await.unwrap();

        assert_eq!(
            texts(&messenger).await,
            vec!["❌ No student found with admission number: 2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_source_outage_looks_like_not_found() {
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(Arc::new(StaticSource::default()), messenger.clone());

        bot.handle_update(update(Some("1"))).await.unwrap();

        assert_eq!(texts(&messenger).await, vec![not_found_text("1")]);
    }

    #[tokio::test]
    async fn test_other_commands_and_empty_updates_ignored() {
        let source = sample_source();
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(source.clone(), messenger.clone());

        bot.handle_update(update(Some("/help"))).await.unwrap();
        bot.handle_update(serde_json::from_str(r#"{"update_id": 3}"#).unwrap())
            .await
            .unwrap();

        assert!(messenger.sent.lock().await.is_empty());
        assert_eq!(*source.fetches.lock().await, 0);
    }

    #[tokio::test]
    async fn test_missing_text_is_looked_up_as_empty_key() {
        let source = sample_source();
        let messenger = Arc::new(RecordingMessenger::default());
        let bot = Bot::new(source.clone(), messenger.clone());

        bot.handle_update(update(None)).await.unwrap();

        assert_eq!(*source.fetches.lock().await, 1);
        assert_eq!(texts(&messenger).await, vec![not_found_text("")]);
    }

    #[tokio::test]
    async fn test_typing_failure_does_not_stop_lookup() {
        let messenger = Arc::new(RecordingMessenger {
            fail_typing: true,
            ..RecordingMessenger::default()
        });
        let bot = Bot::new(sample_source(), messenger.clone());

        bot.handle_update(update(Some("1"))).await.unwrap();

        let replies = texts(&messenger).await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("Alice"));
    }

    #[tokio::test]
    async fn test_send_failure_produces_generic_error() {
        let messenger = Arc::new(RecordingMessenger {
            fail_text: Mutex::new(true),
            ..RecordingMessenger::default()
        });
        let bot = Bot::new(sample_source(), messenger.clone());

        bot.handle_admission(&ChatId::Int(5), "1").await.unwrap();

        assert_eq!(texts(&messenger).await, vec![ERROR_TEXT.to_string()]);
    }
}

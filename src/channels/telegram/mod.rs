pub mod handler;


use super::traits::{ChannelMessage, unix_now};
use crate::providers::build_provider_client_with_timeout;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Outlasts the `getUpdates` long poll.
const HTTP_TIMEOUT: Duration = Duration::from_secs(45);

/// Telegram channel. Long-polls the Bot API for updates
pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, TELEGRAM_API_BASE)
    }

    pub fn with_api_base(bot_token: String, api_base: &str) -> Self {
        Self {
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: build_provider_client_with_timeout(HTTP_TIMEOUT),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

/// Extract text messages from a `getUpdates` payload, advancing `offset`
/// past every update seen (text or not).
pub(crate) fn parse_updates(data: &Value, offset: &mut i64) -> Vec<ChannelMessage> {
    let Some(results) = data.get("result").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut messages = Vec::with_capacity(results.len());
    for update in results {
        if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
            *offset = (*offset).max(uid + 1);
        }

        let Some(message) = update.get("message") else {
            continue;
        };

        let Some(text) = message.get("text").and_then(Value::as_str) else {
            continue;
        };

        let Some(chat_id) = message
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
        else {
            continue;
        };

        messages.push(ChannelMessage {
            id: Uuid::new_v4().to_string(),
            sender: chat_id.to_string(),
            content: text.to_string(),
            channel: "telegram".to_string(),
            timestamp: unix_now(),
        });
    }

    messages
}

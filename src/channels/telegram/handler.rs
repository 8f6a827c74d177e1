use super::{TelegramChannel, parse_updates};
use crate::channels::traits::{Channel, ChannelFuture, ChannelMessage};
use crate::error::TransportError;
use serde_json::Value;
use std::time::Duration;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn max_message_length(&self) -> usize {
        4096
    }

    fn send<'a>(
        &'a self,
        message: &'a str,
        chat_id: &'a str,
    ) -> ChannelFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": message,
            });

            let resp = self
                .client
                .post(self.api_url("sendMessage"))
                .json(&body)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let err = resp
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
                return Err(TransportError::Send {
                    channel: "telegram".to_string(),
                    message: format!("({status}): {err}"),
                }
                .into());
            }

            Ok(())
        })
    }

    fn listen(
        &self,
        tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"]
                });

                let resp = match self
                    .client
                    .post(self.api_url("getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                        continue;
                    }
                };

                let status = resp.status();
                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!(%status, "Telegram parse error: {e}");
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                        continue;
                    }
                };

                // Bad token (401) and a competing poller (409) both answer at once.
                if !status.is_success() || data.get("ok").and_then(Value::as_bool) != Some(true) {
                    let description = data
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("no description");
                    tracing::warn!(%status, "Telegram getUpdates rejected: {description}");
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    continue;
                }

                for msg in parse_updates(&data, &mut offset) {
                    if tx.send(msg).await.is_err() {
                        return Ok(());
                    }
                }
            }
        })
    }

    fn health_check(&self) -> ChannelFuture<'_, bool> {
        Box::pin(async move {
            self.client
                .get(self.api_url("getMe"))
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        })
    }
}

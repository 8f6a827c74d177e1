use super::traits::{Channel, ChannelMessage};
use crate::providers::Provider;

const LOG_PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Turn inbound text into reply text.
///
/// Failed completions are logged and yield `None`: the message is dropped
/// and nothing is sent back.
pub async fn reply_for(provider: &dyn Provider, content: &str) -> Option<String> {
    let request_text = content.trim();
    if request_text.is_empty() {
        tracing::debug!("ignoring empty message");
        return None;
    }

    match provider.complete(request_text).await {
        Ok(reply) => Some(reply),
        Err(e) => {
            tracing::warn!(provider = provider.name(), "completion failed: {e}");
            None
        }
    }
}

/// Handle one inbound message end to end: complete, then reply to the sender.
pub async fn handle_channel_message(
    channel: &dyn Channel,
    provider: &dyn Provider,
    msg: ChannelMessage,
) {
    tracing::info!(
        channel = %msg.channel,
        sender = %msg.sender,
        "message in: {}",
        preview(&msg.content)
    );

    let Some(reply) = reply_for(provider, &msg.content).await else {
        return;
    };

    if reply.is_empty() {
        tracing::warn!(channel = %msg.channel, "completion returned an empty reply; nothing sent");
        return;
    }

    if let Err(e) = channel.send_chunked(&reply, &msg.sender).await {
        tracing::error!(
            channel = %msg.channel,
            sender = %msg.sender,
            "failed to send reply: {e:#}"
        );
    }
}

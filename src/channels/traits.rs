use super::chunker::chunk_message;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

pub type ChannelFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Inbound text from a chat platform.
///
/// `sender` is the reply address: a Telegram chat id or a WeChat user name.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    pub sender: String,
    pub content: String,
    pub channel: String,
    pub timestamp: u64,
}

/// A chat platform the bridge can read from and reply on.
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `message` to `recipient` as a single platform message.
    fn send<'a>(
        &'a self,
        message: &'a str,
        recipient: &'a str,
    ) -> ChannelFuture<'a, anyhow::Result<()>>;

    /// Push inbound messages into `tx` until the platform connection drops
    /// or `tx` is closed.
    fn listen(
        &self,
        tx: mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'_, anyhow::Result<()>>;

    fn health_check(&self) -> ChannelFuture<'_, bool> {
        Box::pin(async { true })
    }

    /// Longest text the platform accepts in one message, in characters.
    fn max_message_length(&self) -> usize {
        usize::MAX
    }

    /// Send `message`, split into as many platform messages as needed.
    fn send_chunked<'a>(
        &'a self,
        message: &'a str,
        recipient: &'a str,
    ) -> ChannelFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            for piece in chunk_message(message, self.max_message_length()) {
                self.send(&piece, recipient).await?;
            }
            Ok(())
        })
    }
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

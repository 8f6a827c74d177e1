pub mod chunker;
pub mod handler;
pub mod runtime;
pub mod telegram;
pub mod traits;
pub mod wechat;

pub use handler::{handle_channel_message, reply_for};
pub use runtime::run_channel;
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelFuture, ChannelMessage};
pub use wechat::{JsonFileCredentialStore, WechatGatewayClient, start_wechat};

use crate::channels::{
    JsonFileCredentialStore, TelegramChannel, WechatGatewayClient, run_channel, start_wechat,
};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::providers::{OpenAiClient, Provider};
use std::sync::Arc;

/// Platform backend chosen from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Wechat,
    Telegram { bot_token: String },
}

/// WeChat wins when its flag is exactly `"true"`; otherwise any Telegram
/// token selects Telegram.
pub fn select_backend(config: &Config) -> Option<Backend> {
    if config.wechat_flag() == Some("true") {
        return Some(Backend::Wechat);
    }

    config.telegram_flag().map(|token| Backend::Telegram {
        bot_token: token.to_string(),
    })
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Ask { message } => ask(&config, &message).await,
    }
}

async fn run(config: Config) -> Result<()> {
    let client = OpenAiClient::from_config(&config);
    if !client.has_credential() {
        tracing::warn!("OPENAI_API_KEY is not set; every message will fail until it is configured");
    }
    let provider: Arc<dyn Provider> = Arc::new(client);

    match select_backend(&config) {
        Some(Backend::Wechat) => {
            tracing::info!("starting WeChat backend");
            let store = JsonFileCredentialStore::new(config.wechat_gateway.token_path.clone());
            let client = Arc::new(WechatGatewayClient::from_config(&config.wechat_gateway));
            start_wechat(client, &store, provider).await
        }
        Some(Backend::Telegram { bot_token }) => {
            tracing::info!("starting Telegram backend");
            let channel = Arc::new(TelegramChannel::with_api_base(
                bot_token,
                &config.telegram_api.base_url,
            ));
            Ok(run_channel(channel, provider).await?)
        }
        None => {
            tracing::warn!("no backend enabled: set WECHAT=true or TELEGRAM=<bot token>");
            Ok(())
        }
    }
}

async fn ask(config: &Config, message: &str) -> Result<()> {
    let client = OpenAiClient::from_config(config);
    let reply = client.complete(message.trim()).await?;
    println!("{reply}");
    Ok(())
}

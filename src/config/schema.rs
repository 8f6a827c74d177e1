use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was loaded from - not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    pub openai_api_key: Option<String>,
    /// `"true"` selects the WeChat backend.
    pub wechat: Option<String>,
    /// Telegram bot token; presence selects the Telegram backend.
    pub telegram: Option<String>,

    #[serde(default)]
    pub wechat_gateway: WechatGatewayConfig,

    #[serde(default)]
    pub telegram_api: TelegramApiConfig,
}

impl Config {
    pub fn openai_api_key(&self) -> Option<&str> {
        non_empty(self.openai_api_key.as_deref())
    }

    pub fn wechat_flag(&self) -> Option<&str> {
        non_empty(self.wechat.as_deref())
    }

    pub fn telegram_flag(&self) -> Option<&str> {
        non_empty(self.telegram.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ── WeChat gateway ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WechatGatewayConfig {
    #[serde(default = "default_wechat_gateway_url")]
    pub base_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
}

fn default_wechat_gateway_url() -> String {
    "http://127.0.0.1:8788".into()
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_login_timeout_secs() -> u64 {
    180
}

impl Default for WechatGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_wechat_gateway_url(),
            token_path: default_token_path(),
            login_timeout_secs: default_login_timeout_secs(),
        }
    }
}

// ── Telegram ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramApiConfig {
    #[serde(default = "default_telegram_api_url")]
    pub base_url: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

impl Default for TelegramApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_telegram_api_url(),
        }
    }
}

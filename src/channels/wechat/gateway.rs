use super::credential::{CredentialStore, SessionCredential};
use super::session::{SessionFuture, WechatContact, WechatSession};
use crate::channels::traits::{Channel, ChannelFuture, ChannelMessage, unix_now};
use crate::config::WechatGatewayConfig;
use crate::error::TransportError;
use crate::providers::build_provider_client_with_timeout;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Prefix of the scannable login URL; the login UUID is appended.
pub const QRCODE_URL: &str = "https://login.weixin.qq.com/qrcode/";

const MESSAGE_POLL_TIMEOUT_SECS: u64 = 30;
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);
/// Outlasts the `/messages` long poll.
const HTTP_TIMEOUT: Duration = Duration::from_secs(MESSAGE_POLL_TIMEOUT_SECS + 15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LoginStatus {
    Ok,
    Pending,
    Failed,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    credential: Option<&'a SessionCredential>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: LoginStatus,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    credential: Option<SessionCredential>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayMessage {
    id: Option<String>,
    from: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    is_self: bool,
}

/// WeChat desktop-protocol client, reached through a local puppet gateway
/// that speaks JSON over HTTP.
pub struct WechatGatewayClient {
    base_url: String,
    login_timeout: Duration,
    client: reqwest::Client,
}

impl WechatGatewayClient {
    pub fn new(base_url: &str, login_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            login_timeout,
            client: build_provider_client_with_timeout(HTTP_TIMEOUT),
        }
    }

    pub fn from_config(config: &WechatGatewayConfig) -> Self {
        Self::new(&config.base_url, Duration::from_secs(config.login_timeout_secs))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.client
            .get(self.api_url(path))
            .send()
            .await
            .with_context(|| format!("wechat gateway GET /{path} failed"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("wechat gateway /{path} returned malformed JSON"))
    }

    async fn wait_for_scan(&self, uuid: &str) -> anyhow::Result<LoginResponse> {
        tracing::info!("scan to log in to WeChat: {QRCODE_URL}{uuid}");
        let deadline = tokio::time::Instant::now() + self.login_timeout;

        loop {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!(
                    "login QR code was not confirmed within {}s",
                    self.login_timeout.as_secs()
                );
            }
            tokio::time::sleep(LOGIN_POLL_INTERVAL).await;

            let status: LoginResponse = self
                .client
                .get(self.api_url("login/status"))
                .query(&[("uuid", uuid)])
                .send()
                .await
                .context("wechat gateway login status poll failed")?
                .error_for_status()?
                .json()
                .await
                .context("wechat gateway login status was malformed")?;

            if status.status != LoginStatus::Pending {
                return Ok(status);
            }
        }
    }

    async fn login(&self, store: &dyn CredentialStore) -> anyhow::Result<()> {
        let stored = store.load();
        let mut response: LoginResponse = self
            .client
            .post(self.api_url("login"))
            .json(&LoginRequest {
                credential: stored.as_ref(),
            })
            .send()
            .await
            .context("wechat gateway login request failed")?
            .error_for_status()?
            .json()
            .await
            .context("wechat gateway login response was malformed")?;

        if response.status == LoginStatus::Pending {
            let uuid = response
                .uuid
                .take()
                .context("gateway asked for a QR login without a uuid")?;
            response = self.wait_for_scan(&uuid).await?;
        }

        match response.status {
            LoginStatus::Ok => {
                let credential = response
                    .credential
                    .context("gateway reported a login without a credential")?;
                store
                    .save(&credential)
                    .with_context(|| format!("failed to persist {}", store.path().display()))?;
                Ok(())
            }
            LoginStatus::Failed | LoginStatus::Pending => anyhow::bail!(
                "wechat login rejected: {}",
                response.message.as_deref().unwrap_or("no reason given")
            ),
        }
    }
}

impl WechatSession for WechatGatewayClient {
    fn hot_login<'a>(&'a self, store: &'a dyn CredentialStore) -> SessionFuture<'a, ()> {
        Box::pin(self.login(store))
    }

    fn current_user(&self) -> SessionFuture<'_, WechatContact> {
        Box::pin(self.get_json("self"))
    }

    fn friends(&self) -> SessionFuture<'_, Vec<WechatContact>> {
        Box::pin(self.get_json("friends"))
    }

    fn groups(&self) -> SessionFuture<'_, Vec<WechatContact>> {
        Box::pin(self.get_json("groups"))
    }

    fn block_contact_requests(&self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            self.client
                .post(self.api_url("contact-requests/block"))
                .send()
                .await
                .context("wechat gateway block request failed")?
                .error_for_status()?;
            Ok(())
        })
    }
}

impl Channel for WechatGatewayClient {
    fn name(&self) -> &str {
        "wechat"
    }

    fn send<'a>(
        &'a self,
        message: &'a str,
        recipient: &'a str,
    ) -> ChannelFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(self.api_url("send"))
                .json(&serde_json::json!({ "to": recipient, "text": message }))
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let err = resp
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
                return Err(TransportError::Send {
                    channel: "wechat".to_string(),
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
            tracing::info!("WeChat channel listening for messages...");

            loop {
                let resp = match self
                    .client
                    .get(self.api_url("messages"))
                    .query(&[("timeout", MESSAGE_POLL_TIMEOUT_SECS)])
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("WeChat poll error: {e}");
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                        continue;
                    }
                };

                let batch: Vec<GatewayMessage> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!("WeChat parse error: {e}");
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                        continue;
                    }
                };

                for incoming in batch {
                    if incoming.is_self {
                        continue;
                    }
                    let Some(text) = incoming.text else {
                        continue;
                    };

                    let msg = ChannelMessage {
                        id: incoming.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                        sender: incoming.from,
                        content: text,
                        channel: "wechat".to_string(),
                        timestamp: unix_now(),
                    };

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
                .get(self.api_url("self"))
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        })
    }
}

pub mod credential;
pub mod gateway;
pub mod session;

#[cfg(test)]
mod tests;

pub use credential::{CredentialStore, JsonFileCredentialStore, SessionCredential};
pub use gateway::WechatGatewayClient;
pub use session::{
    EstablishedSession, LoginAttempt, SessionEstablisher, SessionState, WechatContact,
    WechatSession,
};

use super::runtime::run_channel;
use super::traits::Channel;
use crate::error::Result;
use crate::providers::Provider;
use std::sync::Arc;

/// Establish the WeChat session, then serve messages until shutdown.
///
/// Message handling only starts once the establisher reaches
/// [`SessionState::Blocked`]; any startup failure is returned before a
/// single message is read.
pub async fn start_wechat<C>(
    client: Arc<C>,
    store: &dyn CredentialStore,
    provider: Arc<dyn Provider>,
) -> Result<()>
where
    C: WechatSession + Channel + 'static,
{
    let established = SessionEstablisher::new(&*client, store)
        .establish()
        .await?;
    tracing::info!(
        friends = established.friends.len(),
        groups = established.groups.len(),
        "WeChat session ready for {}",
        established.user.display_name()
    );

    Ok(run_channel(client, provider).await?)
}

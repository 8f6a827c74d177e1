use super::credential::CredentialStore;
use crate::error::SessionError;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WechatContact {
    #[serde(alias = "user_name", alias = "UserName")]
    pub id: String,
    #[serde(default, alias = "NickName")]
    pub nickname: String,
    #[serde(default, alias = "RemarkName")]
    pub remark_name: Option<String>,
}

impl WechatContact {
    pub fn display_name(&self) -> &str {
        self.remark_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.nickname)
    }
}

/// Login-side surface of the WeChat platform client.
pub trait WechatSession: Send + Sync {
    /// Log in with the stored credential, or prompt a fresh login when there
    /// is none. On success the platform side persists the (possibly
    /// refreshed) credential into `store`.
    fn hot_login<'a>(&'a self, store: &'a dyn CredentialStore) -> SessionFuture<'a, ()>;

    fn current_user(&self) -> SessionFuture<'_, WechatContact>;

    fn friends(&self) -> SessionFuture<'_, Vec<WechatContact>>;

    fn groups(&self) -> SessionFuture<'_, Vec<WechatContact>>;

    /// Stop accepting new contact requests for this account.
    fn block_contact_requests(&self) -> SessionFuture<'_, ()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoginAttempt {
    Initial,
    Retry,
}

impl LoginAttempt {
    /// Every login attempt startup may make, in order. The retry bound lives here.
    pub const SEQUENCE: [Self; 2] = [Self::Initial, Self::Retry];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Unauthenticated { retry: u8 },
    Authenticating { attempt: LoginAttempt },
    Authenticated,
    /// Logged in and closed to new contact requests; message handling may start.
    Blocked,
    /// Startup failed. Terminal: message handling never starts.
    Aborted,
}

/// What a successful startup hands to the message loop.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub user: WechatContact,
    pub friends: Vec<WechatContact>,
    pub groups: Vec<WechatContact>,
}

/// Runs the one-shot startup login for the WeChat backend.
///
/// A failed login discards the stored credential and tries exactly once
/// more. Every failure after that is fatal to startup.
pub struct SessionEstablisher<'a> {
    session: &'a dyn WechatSession,
    store: &'a dyn CredentialStore,
    state: SessionState,
    history: Vec<SessionState>,
}

impl<'a> SessionEstablisher<'a> {
    pub fn new(session: &'a dyn WechatSession, store: &'a dyn CredentialStore) -> Self {
        let initial = SessionState::Unauthenticated { retry: 0 };
        Self {
            session,
            store,
            state: initial,
            history: vec![initial],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state visited so far, starting with `Unauthenticated`.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    fn transition(&mut self, next: SessionState) {
        tracing::info!(from = %self.state, to = %next, "wechat session transition");
        self.state = next;
        self.history.push(next);
    }

    /// Run startup to `Blocked`, or to `Aborted` on the first fatal error.
    pub async fn establish(&mut self) -> Result<EstablishedSession, SessionError> {
        let outcome = self.run_startup().await;
        if let Err(e) = &outcome {
            tracing::error!(state = %self.state, "wechat startup aborted: {e}");
            self.transition(SessionState::Aborted);
        }
        outcome
    }

    async fn run_startup(&mut self) -> Result<EstablishedSession, SessionError> {
        self.authenticate().await?;
        self.transition(SessionState::Authenticated);

        let user = self
            .session
            .current_user()
            .await
            .map_err(|e| SessionError::CurrentUser {
                message: format!("{e:#}"),
            })?;
        tracing::info!(id = %user.id, "logged in as {}", user.display_name());

        let friends = self.list_contacts("friend", self.session.friends()).await;
        let groups = self.list_contacts("group", self.session.groups()).await;

        self.session
            .block_contact_requests()
            .await
            .map_err(|e| SessionError::BlockContactRequests {
                message: format!("{e:#}"),
            })?;
        self.transition(SessionState::Blocked);

        Ok(EstablishedSession {
            user,
            friends,
            groups,
        })
    }

    async fn authenticate(&mut self) -> Result<(), SessionError> {
        if self.store.load().is_none() {
            tracing::info!(
                "no stored credential at {}; a fresh login is required",
                self.store.path().display()
            );
        }

        let mut last_error = String::new();
        for attempt in LoginAttempt::SEQUENCE {
            self.transition(SessionState::Authenticating { attempt });

            let error = match self.session.hot_login(self.store).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            last_error = format!("{error:#}");

            match attempt {
                LoginAttempt::Initial => {
                    tracing::warn!(
                        "wechat login failed, discarding stored credential: {last_error}"
                    );
                    self.store
                        .delete()
                        .map_err(|source| SessionError::CredentialDelete {
                            path: self.store.path().to_path_buf(),
                            source,
                        })?;
                    self.transition(SessionState::Unauthenticated { retry: 1 });
                }
                LoginAttempt::Retry => {
                    tracing::error!("wechat login failed after credential reset: {last_error}");
                }
            }
        }

        Err(SessionError::RetryExhausted {
            message: last_error,
        })
    }

    async fn list_contacts(
        &self,
        kind: &str,
        fetch: SessionFuture<'_, Vec<WechatContact>>,
    ) -> Vec<WechatContact> {
        match fetch.await {
            Ok(contacts) => {
                for (i, contact) in contacts.iter().enumerate() {
                    tracing::info!("{kind} {i}: {} ({})", contact.display_name(), contact.id);
                }
                contacts
            }
            Err(e) => {
                tracing::warn!("failed to list {kind}s: {e:#}");
                Vec::new()
            }
        }
    }
}

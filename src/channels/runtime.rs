use super::handler::handle_channel_message;
use super::traits::{Channel, ChannelMessage};
use crate::providers::Provider;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

const LISTENER_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const LISTENER_MAX_BACKOFF: Duration = Duration::from_secs(60);
const INBOUND_QUEUE_CAPACITY: usize = 100;
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Restart delay for a listener: doubles after every use, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    initial: Duration,
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            current: initial,
            max: max.max(initial),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial;
    }

    /// Delay to wait now. The first call after `new`/`reset` returns `initial`.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}

/// Keep `channel.listen` running until the receiving side of `tx` is gone.
pub(crate) fn supervise_listener(
    channel: Arc<dyn Channel>,
    tx: mpsc::Sender<ChannelMessage>,
    mut backoff: Backoff,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tracing::debug!(channel = channel.name(), "starting listener");
            let outcome = channel.listen(tx.clone()).await;

            if tx.is_closed() {
                tracing::debug!(channel = channel.name(), "dispatcher gone; listener stopped");
                return;
            }

            match outcome {
                Ok(()) => {
                    tracing::warn!(channel = channel.name(), "listener returned; restarting");
                    backoff.reset();
                }
                Err(e) => {
                    tracing::error!(channel = channel.name(), "listener failed: {e:#}; restarting");
                }
            }

            tokio::time::sleep(backoff.next_delay()).await;
        }
    })
}

/// Outcome of a startup health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelHealth {
    Healthy,
    Unhealthy,
    Timeout,
}

/// Run `channel.health_check` bounded by `limit` and log the verdict.
pub(crate) async fn check_health(channel: &dyn Channel, limit: Duration) -> ChannelHealth {
    let health = match tokio::time::timeout(limit, channel.health_check()).await {
        Ok(true) => ChannelHealth::Healthy,
        Ok(false) => ChannelHealth::Unhealthy,
        Err(_) => ChannelHealth::Timeout,
    };
    match health {
        ChannelHealth::Healthy => tracing::info!(channel = channel.name(), "health check passed"),
        ChannelHealth::Unhealthy => tracing::warn!(
            channel = channel.name(),
            "health check failed; listening anyway"
        ),
        ChannelHealth::Timeout => tracing::warn!(
            channel = channel.name(),
            "health check timed out after {}s; listening anyway",
            limit.as_secs()
        ),
    }
    health
}

/// Answer every message from `rx` in its own task until `shutdown` resolves
/// or the queue closes. Returns how many replies were still in flight and
/// got aborted by the shutdown.
async fn dispatch_until(
    channel: Arc<dyn Channel>,
    provider: Arc<dyn Provider>,
    mut rx: mpsc::Receiver<ChannelMessage>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!(channel = channel.name(), "shutdown requested");
                let pending = in_flight.len();
                if pending > 0 {
                    tracing::warn!(channel = channel.name(), pending, "aborting unfinished replies");
                }
                in_flight.shutdown().await;
                return pending;
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    tracing::error!(channel = channel.name(), "message handler panicked: {e}");
                }
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let channel = Arc::clone(&channel);
                let provider = Arc::clone(&provider);
                in_flight.spawn(async move {
                    handle_channel_message(channel.as_ref(), provider.as_ref(), msg).await;
                });
            }
        }
    }

    // Queue closed: let the remaining replies finish.
    while in_flight.join_next().await.is_some() {}
    0
}

/// Listen on `channel` and answer every inbound message through `provider`
/// until Ctrl-C.
pub async fn run_channel(
    channel: Arc<dyn Channel>,
    provider: Arc<dyn Provider>,
) -> anyhow::Result<()> {
    check_health(channel.as_ref(), HEALTH_CHECK_TIMEOUT).await;

    let (tx, rx) = mpsc::channel::<ChannelMessage>(INBOUND_QUEUE_CAPACITY);
    let listener = supervise_listener(
        Arc::clone(&channel),
        tx,
        Backoff::new(LISTENER_INITIAL_BACKOFF, LISTENER_MAX_BACKOFF),
    );

    tracing::info!(
        channel = channel.name(),
        provider = provider.name(),
        "listening for messages"
    );

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to wait for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    dispatch_until(channel, provider, rx, ctrl_c).await;

    listener.abort();
    Ok(())
}

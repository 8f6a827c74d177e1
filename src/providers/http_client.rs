use reqwest::Client;
use std::time::Duration;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for completion calls.
pub fn build_provider_client() -> Client {
    build_provider_client_with_timeout(COMPLETION_TIMEOUT)
}

/// Client whose requests give up after `timeout` in total.
pub fn build_provider_client_with_timeout(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to a default HTTP client: {e}");
            Client::new()
        })
}

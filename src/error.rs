use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatbridge`.
///
/// Per-message failures surface as [`CompletionError`] and end only that
/// message's handling. Startup failures surface as [`SessionError`] and stop
/// the process. Channel plumbing keeps using `anyhow::Result` for ad-hoc
/// context chains and converts through [`BridgeError::Other`].
#[derive(Debug, Error)]
pub enum BridgeError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Completion ───────────────────────────────────────────────────────
    #[error("completion: {0}")]
    Completion(#[from] CompletionError),

    // ── Session establishment ────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Channel send ────────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Platform plumbing (anyhow context chains) ───────────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not determine home directory")]
    NoHome,
}

// ─── Completion errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OpenAI API key not set. Set OPENAI_API_KEY or edit config.toml.")]
    MissingCredential,

    #[error("OpenAI request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to encode completion request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("OpenAI response could not be parsed: {reason}")]
    UnparseableResponse { reason: String },
}

impl CompletionError {
    pub(crate) fn unparseable(reason: impl Into<String>) -> Self {
        Self::UnparseableResponse {
            reason: reason.into(),
        }
    }
}

// ─── Session establishment errors ────────────────────────────────────────────

/// Fatal startup failures of the WeChat session establisher.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to delete stale credential {}: {source}", path.display())]
    CredentialDelete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("login failed after credential reset: {message}")]
    RetryExhausted { message: String },

    #[error("failed to fetch logged-in account: {message}")]
    CurrentUser { message: String },

    #[error("failed to block incoming contact requests: {message}")]
    BlockContactRequests { message: String },
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel {channel} send failed: {message}")]
    Send { channel: String, message: String },
}

// ─── Result alias ────────────────────────────────────────────────────────────

pub type Result<T> = std::result::Result<T, BridgeError>;

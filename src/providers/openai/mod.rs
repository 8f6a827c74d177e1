pub mod decode;
pub mod types;

use crate::config::Config;
use crate::error::CompletionError;
use crate::providers::scrub::loggable_body;
use crate::providers::{build_provider_client, traits::Provider};
use decode::{DecodedReply, decode_reply};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::future::Future;
use std::pin::Pin;
use types::{ChatMessage, CompletionRequest};

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Persona prepended to every request.
pub const SYSTEM_PERSONA: &str = "你是一个调皮的助手";

const MODEL: &str = "gpt-3.5-turbo";
const MAX_OUTPUT_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.8;
const TOP_P: u32 = 1;

/// Single-shot chat-completion client.
///
/// Holds no per-call state, so one instance can serve concurrent messages.
/// Every call is an independent POST: no retry, no caching.
pub struct OpenAiClient {
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    endpoint: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_endpoint(api_key, OPENAI_CHAT_COMPLETIONS_URL)
    }

    pub fn with_endpoint(api_key: Option<&str>, endpoint: impl Into<String>) -> Self {
        Self {
            cached_auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            endpoint: endpoint.into(),
            client: build_provider_client(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.openai_api_key())
    }

    pub fn has_credential(&self) -> bool {
        self.cached_auth_header.is_some()
    }

    /// System persona first, then the caller's message.
    pub fn build_request(user_text: &str) -> CompletionRequest {
        CompletionRequest {
            model: MODEL,
            messages: vec![ChatMessage::system(SYSTEM_PERSONA), ChatMessage::user(user_text)],
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: 0,
            presence_penalty: 0,
        }
    }

    /// Send `user_text` and return the trimmed reply.
    pub async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        let auth_header = self
            .cached_auth_header
            .as_ref()
            .ok_or(CompletionError::MissingCredential)?;

        let request = Self::build_request(user_text);
        let request_body = serde_json::to_string(&request)?;
        tracing::info!("request openai json string: {}", loggable_body(&request_body));

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, auth_header)
            .body(request_body)
            .send()
            .await?;

        // Error bodies share the endpoint and are decoded like any other body.
        let status = response.status();
        let raw_body = response.text().await?;
        tracing::info!(%status, "openai response body: {}", loggable_body(&raw_body));

        let decoded = decode_reply(&raw_body)?;
        if let DecodedReply::ApiError(message) = &decoded {
            tracing::warn!(%status, "OpenAI returned an error payload: {message}");
        }

        let reply = decoded.into_text();
        tracing::info!("gpt response full text: {reply}");
        Ok(reply.trim().to_string())
    }
}

impl Provider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(OpenAiClient::complete(self, message))
    }
}

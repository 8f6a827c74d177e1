use super::types::{CompletionErrorResponse, CompletionResponse};
use crate::error::CompletionError;

/// Which shape of the body produced the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedReply {
    /// Content of the first choice.
    Choice(String),
    /// `error.message` of an error body with no usable choice.
    ApiError(String),
}

impl DecodedReply {
    pub fn text(&self) -> &str {
        match self {
            Self::Choice(text) | Self::ApiError(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Choice(text) | Self::ApiError(text) => text,
        }
    }
}

/// Decode a raw completion body against both wire shapes.
///
/// The success shape wins whenever its first choice carries non-empty
/// content. The error shape is always parsed, but only consulted when the
/// success shape produced nothing; a failed error-shape parse never discards a reply
/// that already exists.
pub fn decode_reply(body: &str) -> Result<DecodedReply, CompletionError> {
    let success = serde_json::from_str::<CompletionResponse>(body);
    let error_shape = serde_json::from_str::<CompletionErrorResponse>(body);

    let choice_text = match &success {
        Ok(response) => response.first_choice_content().unwrap_or_default(),
        Err(e) => {
            tracing::debug!("completion body did not match the success shape: {e}");
            ""
        }
    };

    if !choice_text.is_empty() {
        if let Err(e) = &error_shape {
            tracing::debug!("ignoring error-shape parse failure on a successful reply: {e}");
        }
        return Ok(DecodedReply::Choice(choice_text.to_string()));
    }

    match error_shape {
        Ok(error_body) => error_body
            .message()
            .filter(|message| !message.is_empty())
            .map(|message| DecodedReply::ApiError(message.to_string()))
            .ok_or_else(|| {
                CompletionError::unparseable("no choice content and no error.message in body")
            }),
        Err(shape_err) => Err(match success {
            Ok(_) => CompletionError::unparseable(format!(
                "no choice content and error shape did not match: {shape_err}"
            )),
            Err(success_err) => {
                CompletionError::unparseable(format!("body matched neither shape: {success_err}"))
            }
        }),
    }
}

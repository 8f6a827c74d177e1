use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a completion request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub(super) model: &'static str,
    pub(super) messages: Vec<ChatMessage>,
    #[serde(rename = "max_tokens")]
    pub(super) max_output_tokens: u32,
    pub(super) temperature: f32,
    pub(super) top_p: u32,
    pub(super) frequency_penalty: i32,
    pub(super) presence_penalty: i32,
}

impl CompletionRequest {
    pub fn model(&self) -> &str {
        self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Success shape of a chat-completion body.
///
/// Every field is optional or defaulted so an error body still decodes
/// (with no choices) instead of failing outright.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompletionResponse {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    pub usage: Option<Map<String, Value>>,
}

impl CompletionResponse {
    /// Content of the first choice; later choices are ignored.
    pub fn first_choice_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Choice {
    pub index: u32,
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

/// Response-side message. Role and content are lenient because providers
/// emit roles and null contents the request side never sends.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChoiceMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// Error shape of a chat-completion body.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionErrorResponse {
    #[serde(default)]
    pub error: Option<Map<String, Value>>,
}

impl CompletionErrorResponse {
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref()?.get("message")?.as_str()
    }
}

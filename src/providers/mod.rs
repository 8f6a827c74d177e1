pub mod http_client;
pub mod openai;
pub mod scrub;
pub mod traits;

pub use http_client::{build_provider_client, build_provider_client_with_timeout};
pub use openai::OpenAiClient;
pub use openai::decode::{DecodedReply, decode_reply};
pub use openai::types::{ChatMessage, CompletionRequest, Role};
pub use scrub::scrub_secret_patterns;
pub use traits::Provider;

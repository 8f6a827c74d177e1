use crate::error::CompletionError;
use std::future::Future;
use std::pin::Pin;

/// A completion backend: one message in, one reply out.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;
}

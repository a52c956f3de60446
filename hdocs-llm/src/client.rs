//! Completion service abstraction

use crate::LlmResult;
use async_trait::async_trait;

/// One prompt sent to a completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System message framing the model's role
    pub system: String,
    /// User message carrying the context and the code
    pub prompt: String,
}

/// A remote service that turns a prompt into text
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Request one completion; implementations never retry
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;

    /// Model or service name for log lines
    fn name(&self) -> &str;
}

mod anthropic;
mod canned;
mod prompt;

use futures::future::BoxFuture;

pub use anthropic::AnthropicClient;
pub use canned::StaticCompletionClient;
pub use prompt::build_analysis_prompt;

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("llm api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid llm response: {0}")]
    InvalidResponse(String),
}

/// Upstream language model: takes a prompt and returns the full text of the
/// completion.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: String) -> BoxFuture<'_, Result<String, LlmError>>;
}

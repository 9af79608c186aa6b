use crate::llm::{CompletionClient, LlmError};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Answers every prompt with the same completion.
#[derive(Clone, Debug)]
pub struct StaticCompletionClient {
    completion: String,
}

impl StaticCompletionClient {
    pub fn new<S: Into<String>>(completion: S) -> Self {
        Self {
            completion: completion.into(),
        }
    }
}

impl CompletionClient for StaticCompletionClient {
    fn complete(&self, _prompt: String) -> BoxFuture<'_, Result<String, LlmError>> {
        async move { Ok(self.completion.clone()) }.boxed()
    }
}

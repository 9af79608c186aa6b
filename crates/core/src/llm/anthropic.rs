use crate::config::{ApiKey, LlmConfig};
use crate::llm::{CompletionClient, LlmError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const LOG_TARGET: &str = "llm::anthropic";

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: ApiKey,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(api_key: ApiKey, config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn completion_text(response: MessagesResponse) -> Result<String, LlmError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| LlmError::InvalidResponse("no text block in response".to_string()))
}

impl CompletionClient for AnthropicClient {
    fn complete(&self, prompt: String) -> BoxFuture<'_, Result<String, LlmError>> {
        let this = self.clone();
        async move {
            let request = MessagesRequest {
                model: &this.config.model,
                max_tokens: this.config.max_tokens,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            };

            let url = this.config.base_url.join("v1/messages");

            let response = this
                .client
                .post(&url)
                .header("x-api-key", this.api_key.expose())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                tracing::error!(target: LOG_TARGET, %status, %body, "anthropic api error");
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: MessagesResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse JSON: {e}")))?;

            tracing::debug!(target: LOG_TARGET, "completion received");
            completion_text(parsed)
        }
        .boxed()
    }
}

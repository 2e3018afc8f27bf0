//! Anthropic Messages API caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::http::send_with_retry;
use super::{non_empty_key, parse_json_payload, AiProvider, ProviderError};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// Text of the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    max_attempts: u32,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: Option<String>, max_attempts: u32) -> Self {
        Self {
            client,
            api_key,
            max_attempts,
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn is_configured(&self) -> bool {
        non_empty_key(&self.api_key)
    }

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::NotConfigured)?;

        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = send_with_retry("anthropic", self.max_attempts, || {
            self.client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
        })
        .await?;

        let message: MessagesResponse = response.json().await?;

        debug!(
            "anthropic call succeeded: input_tokens={}, output_tokens={}",
            message.usage.input_tokens, message.usage.output_tokens
        );

        let text = message.text().ok_or(ProviderError::EmptyContent)?;
        parse_json_payload(text)
    }
}

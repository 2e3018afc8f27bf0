//! OpenAI-compatible chat completions. Z.AI and Flowith speak the same wire format,
//! so one caller covers all three with a different base URL and model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::http::send_with_retry;
use super::{non_empty_key, parse_json_payload, AiProvider, ProviderError};

const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiCompatible {
    name: &'static str,
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_attempts: u32,
}

impl OpenAiCompatible {
    pub fn new(
        name: &'static str,
        client: Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            name,
            client,
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            max_attempts,
        }
    }

    pub fn openai(client: Client, api_key: Option<String>, max_attempts: u32) -> Self {
        Self::new(
            "openai",
            client,
            api_key,
            "https://api.openai.com/v1",
            "gpt-4o-mini",
            max_attempts,
        )
    }

    pub fn zai(client: Client, api_key: Option<String>, max_attempts: u32) -> Self {
        Self::new("zai", client, api_key, "https://api.z.ai/v1", "gpt-3.5-turbo", max_attempts)
    }

    pub fn flowith(client: Client, api_key: Option<String>, max_attempts: u32) -> Self {
        Self::new(
            "flowith",
            client,
            api_key,
            "https://api.flowith.io/v1",
            "gpt-4o-mini",
            max_attempts,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AiProvider for OpenAiCompatible {
    fn name(&self) -> &str {
        self.name
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

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let url = self.endpoint();

        let response = send_with_retry(self.name, self.max_attempts, || {
            self.client.post(&url).bearer_auth(api_key).json(&body)
        })
        .await?;

        let completion: ChatResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ProviderError::EmptyContent)?;

        debug!("{} returned {} chars", self.name, text.len());
        parse_json_payload(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_without_key() {
        let provider = OpenAiCompatible::openai(Client::new(), None, 1);
        assert!(!provider.is_configured());
        let provider = OpenAiCompatible::zai(Client::new(), Some(String::new()), 1);
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_presets_have_distinct_names() {
        let key = Some("k".to_string());
        let names = [
            OpenAiCompatible::openai(Client::new(), key.clone(), 1).name,
            OpenAiCompatible::zai(Client::new(), key.clone(), 1).name,
            OpenAiCompatible::flowith(Client::new(), key, 1).name,
        ];
        assert_eq!(names, ["openai", "zai", "flowith"]);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAiCompatible::new(
            "custom",
            Client::new(),
            None,
            "https://llm.example.ma/v1/",
            "m",
            1,
        );
        assert_eq!(provider.endpoint(), "https://llm.example.ma/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_complete_json_without_key_makes_no_call() {
        let provider = OpenAiCompatible::openai(Client::new(), None, 1);
        let result = provider.complete_json("sys", "prompt").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }

    #[test]
    fn test_chat_response_deserializes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"city\":\"Rabat\"}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"city\":\"Rabat\"}")
        );
    }
}

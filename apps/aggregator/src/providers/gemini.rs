//! Google Gemini `generateContent` REST caller with JSON response mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::http::send_with_retry;
use super::{non_empty_key, parse_json_payload, AiProvider, ProviderError};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
    }
}

pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    max_attempts: u32,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: Option<String>, max_attempts: u32) -> Self {
        Self {
            client,
            api_key,
            max_attempts,
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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

        let url = format!("{API_BASE}/{MODEL}:generateContent");
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.3
            }
        });

        let response = send_with_retry("gemini", self.max_attempts, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
        })
        .await?;

        let generated: GenerateResponse = response.json().await?;
        let text = generated.text().ok_or(ProviderError::EmptyContent)?;

        debug!("gemini returned {} chars", text.len());
        parse_json_payload(&text)
    }
}

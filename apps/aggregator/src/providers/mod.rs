//! AI providers. Every external model is reached through the `AiProvider` trait.
//!
//! A provider takes a system prompt and a user prompt and returns a JSON value, or
//! fails. Callers never branch on which vendor answered; the chain order is data.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod anthropic;
#[cfg(test)]
pub mod fake;
pub mod gemini;
mod http;
pub mod openai;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider has no credentials configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("provider returned empty content")]
    EmptyContent,
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Providers without credentials are skipped by the chain and never called.
    fn is_configured(&self) -> bool;

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, ProviderError>;
}

/// Ordered list of providers, tried one at a time.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn AiProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self { providers }
    }

    pub fn configured(&self) -> impl Iterator<Item = &Arc<dyn AiProvider>> + '_ {
        self.providers.iter().filter(|p| p.is_configured())
    }

    pub fn has_configured(&self) -> bool {
        self.configured().next().is_some()
    }

    pub fn configured_names(&self) -> Vec<String> {
        self.configured().map(|p| p.name().to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
    ZAi,
    Flowith,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "zai" | "z.ai" => Ok(ProviderKind::ZAi),
            "flowith" => Ok(ProviderKind::Flowith),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Builds the chain in the configured order, sharing one HTTP client.
pub fn build_chain(config: &Config, client: &reqwest::Client) -> ProviderChain {
    let attempts = config.provider_max_attempts;
    let providers = config
        .enrichment_providers
        .iter()
        .map(|kind| -> Arc<dyn AiProvider> {
            match kind {
                ProviderKind::OpenAi => Arc::new(openai::OpenAiCompatible::openai(
                    client.clone(),
                    config.openai_api_key.clone(),
                    attempts,
                )),
                ProviderKind::ZAi => Arc::new(openai::OpenAiCompatible::zai(
                    client.clone(),
                    config.zai_api_key.clone(),
                    attempts,
                )),
                ProviderKind::Flowith => Arc::new(openai::OpenAiCompatible::flowith(
                    client.clone(),
                    config.flowith_api_key.clone(),
                    attempts,
                )),
                ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
                    client.clone(),
                    config.gemini_api_key.clone(),
                    attempts,
                )),
                ProviderKind::Anthropic => Arc::new(anthropic::AnthropicProvider::new(
                    client.clone(),
                    config.anthropic_api_key.clone(),
                    attempts,
                )),
            }
        })
        .collect();
    ProviderChain::new(providers)
}

/// Parses model output as JSON, tolerating code fences and surrounding prose.
pub fn parse_json_payload(text: &str) -> Result<Value, ProviderError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(ProviderError::EmptyContent);
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) => embedded_json(text)
            .and_then(|inner| serde_json::from_str(inner).ok())
            .ok_or(ProviderError::Parse(e)),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim()),
        None => text,
    }
}

/// The outermost `{...}` or `[...]` span inside free text.
fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

pub(crate) fn non_empty_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

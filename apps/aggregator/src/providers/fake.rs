//! Scripted providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{AiProvider, ProviderError};

pub struct FakeProvider {
    name: String,
    configured: bool,
    answer: Option<Value>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// Configured provider that always answers `answer`.
    pub fn answering(name: &str, answer: Value) -> Self {
        Self::build(name, true, Some(answer))
    }

    /// Configured provider whose every call fails with a 503.
    pub fn failing(name: &str) -> Self {
        Self::build(name, true, None)
    }

    /// Provider without credentials. Calling it is a test failure.
    pub fn unconfigured(name: &str) -> Self {
        Self::build(name, false, None)
    }

    fn build(name: &str, configured: bool, answer: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            configured,
            answer,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete_json(&self, _system: &str, prompt: &str) -> Result<Value, ProviderError> {
        assert!(self.configured, "{} called without credentials", self.name);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answer {
            Some(value) => Ok(value.clone()),
            None => Err(ProviderError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }),
        }
    }
}

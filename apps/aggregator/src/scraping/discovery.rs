//! Asks the configured providers for fresh postings when scraping alone is not enough.

use tracing::{info, warn};

use crate::models::posting::RawPosting;
use crate::pipeline::extractor::{extract, SourceConfig, SourceDocument};
use crate::providers::ProviderChain;
use crate::scraping::prompts::{DISCOVERY_PROMPT, DISCOVERY_SYSTEM};
use crate::scraping::sites::SiteConfig;

const DISCOVERY_COUNT: usize = 15;

pub struct Discovered {
    pub provider: String,
    pub postings: Vec<RawPosting>,
}

fn render_prompt(sites: &[SiteConfig]) -> String {
    let mut names: Vec<&str> = sites.iter().map(|s| s.source.as_str()).collect();
    names.dedup();
    DISCOVERY_PROMPT
        .replace("{count}", &DISCOVERY_COUNT.to_string())
        .replace("{sites}", &names.join(", "))
}

/// First configured provider, in chain order, whose answer yields at least one
/// posting. `None` when no provider is configured or none produced anything.
pub async fn discover(chain: &ProviderChain, sites: &[SiteConfig]) -> Option<Discovered> {
    let prompt = render_prompt(sites);
    for provider in chain.configured() {
        let value = match provider.complete_json(DISCOVERY_SYSTEM, &prompt).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Discovery via {} failed: {e}", provider.name());
                continue;
            }
        };
        let postings = extract(
            SourceConfig::Provider(provider.name()),
            SourceDocument::ProviderResponse(&value),
        );
        if postings.is_empty() {
            warn!("Discovery via {} returned no usable postings", provider.name());
            continue;
        }
        info!(
            "Discovered {} postings via {}",
            postings.len(),
            provider.name()
        );
        return Some(Discovered {
            provider: provider.name().to_string(),
            postings,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::providers::fake::FakeProvider;
    use crate::providers::AiProvider;
    use crate::scraping::sites::builtin_sites;

    #[tokio::test]
    async fn test_first_productive_provider_wins() {
        let empty = Arc::new(FakeProvider::answering("openai", json!([])));
        let failing = Arc::new(FakeProvider::failing("zai"));
        let good = Arc::new(FakeProvider::answering(
            "gemini",
            json!([{"title": "Comptable", "company": "X", "city": "Rabat"}]),
        ));
        let never = Arc::new(FakeProvider::answering("anthropic", json!([])));
        let providers: Vec<Arc<dyn AiProvider>> =
            vec![empty.clone(), failing.clone(), good.clone(), never.clone()];
        let chain = ProviderChain::new(providers);

        let found = discover(&chain, &builtin_sites()).await.unwrap();

        assert_eq!(found.provider, "gemini");
        assert_eq!(found.postings.len(), 1);
        assert_eq!(found.postings[0].source_name, "gemini");
        assert_eq!(empty.calls(), 1);
        assert_eq!(failing.calls(), 1);
        assert_eq!(never.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_configured_provider() {
        let chain = ProviderChain::new(vec![Arc::new(FakeProvider::unconfigured("openai"))]);
        assert!(discover(&chain, &builtin_sites()).await.is_none());
    }

    #[test]
    fn test_prompt_lists_sites() {
        let prompt = render_prompt(&builtin_sites());
        assert!(prompt.contains("rekrute.com, emploi.ma"));
        assert!(prompt.starts_with("List the 15 newest"));
    }
}

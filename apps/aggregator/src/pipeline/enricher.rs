//! Enricher: fills gaps the keyword rules left, using the first provider that answers.
//!
//! Providers are tried one after another, never raced. Only a complete, parseable
//! answer is merged; a failing provider contributes nothing.

use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::posting::{
    Category, ContractType, EnrichedPosting, NormalizedPosting, UNKNOWN_CITY,
};
use crate::pipeline::normalizer::{
    classify_contract, detect_city, extract_email, extract_phone, extract_skills,
};
use crate::pipeline::prompts::{ENRICH_PROMPT, ENRICH_SYSTEM};
use crate::pipeline::text::{collapse_whitespace, truncate_chars};
use crate::providers::{ProviderChain, ProviderError};

/// Length of the rule-based summary.
pub const FALLBACK_SUMMARY_CHARS: usize = 200;
const PROMPT_DESCRIPTION_CHARS: usize = 500;
const MAX_SUMMARY_CHARS: usize = 600;

/// Throttling for batch enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Postings enriched concurrently.
    pub size: usize,
    /// Pause between two groups.
    pub delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            size: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Fields a provider may supply. Everything is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiEnrichment {
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub skills: Vec<String>,
    pub summary: Option<String>,
    pub city: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl AiEnrichment {
    /// Reads a provider answer. Non-objects are a parse failure and an object with no
    /// usable field counts as empty content, so the chain moves on in both cases.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        let Some(obj) = value.as_object() else {
            return Err(ProviderError::Parse(serde::de::Error::custom(
                "enrichment answer is not a JSON object",
            )));
        };

        let skills = match obj.get("skills") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(list)) => list
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let enrichment = Self {
            category: string_field(obj, "category"),
            job_type: string_field(obj, "job_type").or_else(|| string_field(obj, "contract")),
            skills,
            summary: string_field(obj, "summary"),
            city: string_field(obj, "city"),
            company_email: string_field(obj, "company_email"),
            company_phone: string_field(obj, "company_phone"),
            company_website: string_field(obj, "company_website"),
        };

        if enrichment == Self::default() {
            return Err(ProviderError::EmptyContent);
        }
        Ok(enrichment)
    }
}

/// Summary used when no provider answered: the start of the description, else the title.
pub fn fallback_summary(posting: &NormalizedPosting) -> String {
    match posting.description.as_deref().map(collapse_whitespace) {
        Some(d) if !d.is_empty() => truncate_chars(&d, FALLBACK_SUMMARY_CHARS).to_string(),
        _ => posting.title.clone(),
    }
}

fn normalize_website(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&candidate).ok()?;
    // A bare word is not a website.
    url.host_str()
        .is_some_and(|host| host.contains('.'))
        .then(|| url.to_string())
}

/// Merges an answer into the rule-based posting. A rule-based value is replaced only
/// when it is the default placeholder (General, Unspecified, Maroc, empty, none).
pub fn merge(
    mut posting: NormalizedPosting,
    ai: AiEnrichment,
    provider: &str,
) -> EnrichedPosting {
    if posting.category == Category::General {
        if let Some(category) = ai.category.as_deref().and_then(Category::parse) {
            posting.category = category;
        }
    }

    if posting.contract_type == ContractType::Unspecified {
        if let Some(job_type) = ai.job_type.as_deref() {
            posting.contract_type = classify_contract(job_type);
        }
    }

    if posting.city == UNKNOWN_CITY {
        if let Some(city) = ai.city.as_deref().and_then(detect_city) {
            posting.city = city.to_string();
        }
    }

    if posting.skills.is_empty() && !ai.skills.is_empty() {
        posting.skills = extract_skills(&ai.skills.join(" , "));
    }

    if posting.contact_email.is_none() {
        posting.contact_email = ai.company_email.as_deref().and_then(extract_email);
    }
    if posting.contact_phone.is_none() {
        posting.contact_phone = ai.company_phone.as_deref().and_then(extract_phone);
    }
    if posting.contact_website.is_none() {
        posting.contact_website = ai.company_website.as_deref().and_then(normalize_website);
    }

    let summary = match ai.summary {
        Some(s) => truncate_chars(&collapse_whitespace(&s), MAX_SUMMARY_CHARS).to_string(),
        None => fallback_summary(&posting),
    };

    EnrichedPosting {
        posting,
        summary,
        enriched_by: Some(provider.to_string()),
    }
}

fn render_prompt(posting: &NormalizedPosting) -> String {
    let description = posting
        .description
        .as_deref()
        .map(|d| truncate_chars(d, PROMPT_DESCRIPTION_CHARS))
        .unwrap_or("");
    ENRICH_PROMPT
        .replace("{title}", &posting.title)
        .replace("{company}", posting.company.as_deref().unwrap_or("Non précisé"))
        .replace(
            "{location}",
            posting.location.as_deref().unwrap_or(&posting.city),
        )
        .replace("{description}", description)
}

pub fn rule_based(posting: NormalizedPosting) -> EnrichedPosting {
    let summary = fallback_summary(&posting);
    EnrichedPosting {
        posting,
        summary,
        enriched_by: None,
    }
}

/// Enriches one posting through the chain. Unconfigured providers are skipped without
/// a call; if nothing answers, the rule-based values are kept.
pub async fn enrich(posting: NormalizedPosting, chain: &ProviderChain) -> EnrichedPosting {
    if !chain.has_configured() {
        return rule_based(posting);
    }

    let prompt = render_prompt(&posting);
    for provider in chain.configured() {
        let answer = provider
            .complete_json(ENRICH_SYSTEM, &prompt)
            .await
            .and_then(|value| AiEnrichment::from_value(&value));
        match answer {
            Ok(ai) => {
                debug!("Enriched '{}' with {}", posting.title, provider.name());
                return merge(posting, ai, provider.name());
            }
            Err(e) => {
                warn!(
                    "Provider {} failed for '{}': {e}",
                    provider.name(),
                    posting.title
                );
            }
        }
    }

    debug!("No provider answered for '{}', keeping rule-based values", posting.title);
    rule_based(posting)
}

/// Enriches in groups of `policy.size`, concurrently inside a group, pausing
/// `policy.delay` between groups. Output order matches input order.
pub async fn enrich_batch(
    postings: Vec<NormalizedPosting>,
    chain: &ProviderChain,
    policy: BatchPolicy,
) -> Vec<EnrichedPosting> {
    if !chain.has_configured() {
        return postings.into_iter().map(rule_based).collect();
    }

    let size = policy.size.max(1);
    let total = postings.len();
    let mut enriched = Vec::with_capacity(total);
    let mut pending = postings.into_iter().peekable();

    while pending.peek().is_some() {
        if !enriched.is_empty() && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
        let group: Vec<_> = pending.by_ref().take(size).collect();
        enriched.extend(join_all(group.into_iter().map(|p| enrich(p, chain))).await);
    }

    let by_ai = enriched.iter().filter(|e| e.enriched_by.is_some()).count();
    info!("Enriched {total} postings ({by_ai} by AI)");
    enriched
}

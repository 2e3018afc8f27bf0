//! Extractor: site HTML or provider JSON in, raw postings out.
//!
//! Never fails. A selector that does not parse, a page with no cards or a malformed
//! provider answer all produce an empty list and a log line.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::models::posting::RawPosting;
use crate::pipeline::text::{collapse_whitespace, has_arabic, non_empty, truncate_chars};
use crate::scraping::sites::SiteConfig;

pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Where a document came from.
#[derive(Debug, Clone, Copy)]
pub enum SourceConfig<'a> {
    Site(&'a SiteConfig),
    /// An AI provider, by name. The name becomes the fallback source name.
    Provider(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub enum SourceDocument<'a> {
    Html(&'a str),
    ProviderResponse(&'a Value),
}

pub fn extract(source: SourceConfig<'_>, document: SourceDocument<'_>) -> Vec<RawPosting> {
    match (source, document) {
        (SourceConfig::Site(site), SourceDocument::Html(html)) => extract_html(site, html),
        (SourceConfig::Provider(name), SourceDocument::ProviderResponse(value)) => {
            extract_provider(name, value)
        }
        (SourceConfig::Site(site), SourceDocument::ProviderResponse(_)) => {
            warn!("{}: expected HTML, got a provider response", site.name);
            Vec::new()
        }
        (SourceConfig::Provider(name), SourceDocument::Html(_)) => {
            warn!("{name}: expected a provider response, got HTML");
            Vec::new()
        }
    }
}

/// Absolute http(s) URL, or `None` for blanks, `#` anchors and anything unparseable.
pub fn usable_url(candidate: Option<&str>) -> Option<String> {
    let candidate = candidate?.trim();
    if candidate.is_empty() || candidate.starts_with('#') {
        return None;
    }
    let parsed = Url::parse(candidate).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Hard filter shared by every source: a title, plus a usable URL or a company to
/// carry the identity.
pub fn keep_valid(raw: RawPosting) -> Option<RawPosting> {
    let title = collapse_whitespace(&raw.title);
    if title.is_empty() {
        return None;
    }
    let source_url = usable_url(raw.source_url.as_deref());
    let company = non_empty(raw.company);
    if source_url.is_none() && company.is_none() {
        return None;
    }
    let description = non_empty(raw.description)
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS).to_string());
    Some(RawPosting {
        title,
        company,
        location: non_empty(raw.location),
        description,
        source_url,
        contract: non_empty(raw.contract),
        salary: non_empty(raw.salary),
        contact_email: non_empty(raw.contact_email),
        contact_phone: non_empty(raw.contact_phone),
        source_name: raw.source_name.trim().to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// HTML
// ────────────────────────────────────────────────────────────────────────────

struct CompiledSelectors {
    card: Selector,
    title: Selector,
    link: Selector,
    company: Option<Selector>,
    location: Option<Selector>,
    description: Option<Selector>,
}

fn compile_selectors(site: &SiteConfig) -> Option<CompiledSelectors> {
    let parse = |css: &str| match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("{}: invalid selector '{css}': {e:?}", site.name);
            None
        }
    };
    let parse_optional = |css: &Option<String>| match css {
        Some(css) => parse(css).map(Some),
        None => Some(None),
    };
    let s = &site.selectors;
    Some(CompiledSelectors {
        card: parse(&s.card)?,
        title: parse(&s.title)?,
        link: parse(&s.link)?,
        company: parse_optional(&s.company)?,
        location: parse_optional(&s.location)?,
        description: parse_optional(&s.description)?,
    })
}

fn first_text(card: &ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let el = card.select(selector?).next()?;
    let text = collapse_whitespace(&el.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn first_href(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    // The card itself may be the link.
    if card.value().name() == "a" {
        if let Some(href) = card.value().attr("href") {
            return Some(href.to_string());
        }
    }
    card.select(selector)
        .find_map(|el| el.value().attr("href"))
        .map(str::to_string)
}

fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let joined = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    usable_url(Some(joined.as_str()))
}

fn extract_html(site: &SiteConfig, html: &str) -> Vec<RawPosting> {
    let Some(selectors) = compile_selectors(site) else {
        return Vec::new();
    };
    let base = Url::parse(&site.base_url).ok();
    if base.is_none() {
        warn!("{}: base_url '{}' is not a valid URL", site.name, site.base_url);
    }

    let document = Html::parse_document(html);
    let mut postings = Vec::new();
    let mut cards = 0usize;
    let mut arabic = 0usize;

    for card in document.select(&selectors.card) {
        cards += 1;
        let Some(title) = first_text(&card, Some(&selectors.title)) else {
            continue;
        };
        // Site cards always need a link, even when a company is present.
        let Some(url) =
            first_href(&card, &selectors.link).and_then(|h| resolve_link(base.as_ref(), &h))
        else {
            continue;
        };
        let description = first_text(&card, selectors.description.as_ref());

        if site.skip_arabic
            && (has_arabic(&title) || description.as_deref().is_some_and(has_arabic))
        {
            arabic += 1;
            continue;
        }

        let raw = RawPosting {
            title,
            company: first_text(&card, selectors.company.as_ref()),
            location: first_text(&card, selectors.location.as_ref()),
            description,
            source_url: Some(url),
            source_name: site.source.clone(),
            ..RawPosting::default()
        };
        postings.extend(keep_valid(raw));
    }

    if cards == 0 {
        warn!("{}: card selector '{}' matched nothing", site.name, site.selectors.card);
    }
    debug!(
        "{}: {} cards, {} postings, {} skipped as Arabic",
        site.name,
        cards,
        postings.len(),
        arabic
    );
    postings
}

// ────────────────────────────────────────────────────────────────────────────
// Provider JSON
// ────────────────────────────────────────────────────────────────────────────

/// String field by any of `keys`; numbers are accepted and stringified.
fn field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) => non_empty(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn extract_provider(provider: &str, value: &Value) -> Vec<RawPosting> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("jobs").or_else(|| obj.get("postings")) {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("{provider}: response object has no jobs array");
                return Vec::new();
            }
        },
        _ => {
            warn!("{provider}: response is neither an array nor an object");
            return Vec::new();
        }
    };

    let total = items.len();
    let postings: Vec<RawPosting> = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            keep_valid(RawPosting {
                title: field(obj, &["title"]).unwrap_or_default(),
                company: field(obj, &["company"]),
                location: field(obj, &["city", "location"]),
                description: field(obj, &["description"]),
                source_url: field(obj, &["url", "source_url"]),
                contract: field(obj, &["contract", "job_type"]),
                salary: field(obj, &["salary"]),
                contact_email: field(obj, &["company_email", "email"]),
                contact_phone: field(obj, &["company_phone", "phone"]),
                source_name: field(obj, &["source"]).unwrap_or_else(|| provider.to_string()),
            })
        })
        .collect();

    debug!("{provider}: kept {}/{} postings", postings.len(), total);
    postings
}

//! Per-site extraction settings. Every site is data; one extractor runs them all.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Placeholder in `list_url` replaced with the 1-based page number.
pub const PAGE_PLACEHOLDER: &str = "{page}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// One element per job card.
    pub card: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Stored as the posting's source name.
    pub source: String,
    pub list_url: String,
    #[serde(default = "default_pages")]
    pub pages: u32,
    pub base_url: String,
    pub selectors: SelectorSet,
    #[serde(default)]
    pub skip_arabic: bool,
}

fn default_pages() -> u32 {
    1
}

impl SiteConfig {
    /// Listing URLs to fetch, in page order. A `list_url` without the page
    /// placeholder is fetched once.
    pub fn page_urls(&self) -> Vec<String> {
        if !self.list_url.contains(PAGE_PLACEHOLDER) {
            return vec![self.list_url.clone()];
        }
        (1..=self.pages.max(1))
            .map(|page| self.list_url.replace(PAGE_PLACEHOLDER, &page.to_string()))
            .collect()
    }
}

fn selectors(
    card: &str,
    title: &str,
    company: &str,
    location: &str,
    description: &str,
    link: &str,
) -> SelectorSet {
    SelectorSet {
        card: card.to_string(),
        title: title.to_string(),
        company: Some(company.to_string()),
        location: Some(location.to_string()),
        description: Some(description.to_string()),
        link: link.to_string(),
    }
}

fn site(
    name: &str,
    source: &str,
    list_url: &str,
    pages: u32,
    base_url: &str,
    selectors: SelectorSet,
) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        source: source.to_string(),
        list_url: list_url.to_string(),
        pages,
        base_url: base_url.to_string(),
        selectors,
        skip_arabic: true,
    }
}

/// The sites scraped when no `SITES_FILE` is given.
pub fn builtin_sites() -> Vec<SiteConfig> {
    vec![
        site(
            "ReKrute",
            "rekrute.com",
            "https://www.rekrute.com/offres.html?s=1&p={page}",
            10,
            "https://www.rekrute.com",
            selectors(
                ".post-id, .job-list article, .job-item",
                "h2, h3, h4, .job-title, [class*=\"title\"]",
                ".company, [class*=\"company\"], .recruiter",
                ".location, [class*=\"location\"], .city",
                ".description, [class*=\"description\"], p",
                "a[href*=\"emploi\"], a",
            ),
        ),
        site(
            "Emploi.ma",
            "emploi.ma",
            "https://www.emploi.ma/recherche-jobs-maroc?page={page}",
            3,
            "https://www.emploi.ma",
            selectors(
                ".job-description, .job-list-item, article",
                "h2, h3, h4, h5, .job-title, [class*=\"title\"]",
                ".company-name, [class*=\"company\"], .employer",
                ".job-location, [class*=\"location\"], .city",
                ".job-description-text, [class*=\"description\"], p",
                "a[href*=\"/offre\"], a",
            ),
        ),
        site(
            "Dreamjob",
            "dreamjob.ma",
            "https://www.dreamjob.ma/emploi/page/{page}/",
            10,
            "https://www.dreamjob.ma",
            selectors(
                "article",
                "h2 a, h3 a, .job-title a, a[class*=\"title\"]",
                ".company, .company-name, [class*=\"company\"]",
                ".location, .city, [class*=\"location\"], [class*=\"ville\"]",
                ".description, .summary, .excerpt, p",
                "h2 a, h3 a, a[class*=\"title\"]",
            ),
        ),
        site(
            "MarocEmploi",
            "marocemploi.net",
            "https://www.marocemploi.net/",
            1,
            "https://www.marocemploi.net",
            selectors(
                ".job-listing, .offre, article, .job-item",
                "h2, h3, .title, .job-title",
                ".company, .entreprise, .employer",
                ".location, .ville, .city",
                ".description, .excerpt, p",
                "a",
            ),
        ),
        site(
            "Alwadifa-Maroc",
            "alwadifa-maroc.com",
            "https://www.alwadifa-maroc.com/",
            1,
            "https://www.alwadifa-maroc.com",
            selectors(
                ".job-listing, .concours-item, article",
                "h2, h3, .title",
                ".company, .organisme",
                ".location, .ville",
                ".description, .excerpt",
                "a",
            ),
        ),
        site(
            "Bayt",
            "bayt.com",
            "https://www.bayt.com/en/morocco/jobs/?page={page}",
            3,
            "https://www.bayt.com",
            selectors(
                ".jb-list li, .job-card, [data-job-id]",
                "h2, .job-title, a[data-js-link]",
                ".company, .comp-name",
                ".location, .loc",
                ".description, .job-snippet",
                "a[href*=\"/job\"]",
            ),
        ),
        site(
            "MarocEmploi.cc",
            "marocemploi.cc",
            "https://www.marocemploi.cc/page/{page}/",
            5,
            "https://www.marocemploi.cc",
            selectors(
                "article",
                "h2 a, h3 a, h1 a, .entry-title a, a[rel=\"bookmark\"]",
                ".company, .author, .meta",
                ".location, .ville, .city, .lieu, .localisation, [class*=\"location\"]",
                ".entry-content, .excerpt, .summary, p",
                "h2 a, h3 a, h1 a, a[rel=\"bookmark\"]",
            ),
        ),
        site(
            "ANAPEC",
            "anapec.org",
            "https://www.anapec.org/sigec-app-rv/chercher_offre_page/entreprise",
            1,
            "https://www.anapec.org",
            selectors(
                ".resultat-recherche .offre-item, .job-card, article",
                "h3, h4, .titre-offre, .job-title",
                ".entreprise, .company, .employeur",
                ".ville, .location, .lieu",
                ".description, .details, p",
                "a[href*=\"offre\"], a",
            ),
        ),
    ]
}

/// Reads a JSON array of site configs that replaces the built-in registry.
pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sites file {}", path.display()))?;
    let sites: Vec<SiteConfig> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid sites file {}", path.display()))?;
    if sites.is_empty() {
        anyhow::bail!("Sites file {} lists no sites", path.display());
    }
    Ok(sites)
}

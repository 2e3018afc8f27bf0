//! Drives sources through extract, normalize, enrich and upsert.
//!
//! Sites run strictly one after another. A site whose pages cannot be fetched or whose
//! batch cannot be written is logged and reported; the next site still runs.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::posting::RawPosting;
use crate::pipeline::dedup::{upsert, UpsertError, UpsertReport};
use crate::pipeline::enricher::{enrich_batch, BatchPolicy};
use crate::pipeline::extractor::{extract, keep_valid, SourceConfig, SourceDocument};
use crate::pipeline::normalizer::normalize;
use crate::providers::ProviderChain;
use crate::scraping::discovery::discover;
use crate::scraping::{PageSource, SiteConfig};
use crate::store::{ConflictPolicy, JobStore};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub batch: BatchPolicy,
    pub conflict: ConflictPolicy,
    /// Pause between pages of a site and between sites.
    pub site_delay: Duration,
    pub discovery_enabled: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch: BatchPolicy::default(),
            conflict: ConflictPolicy::Ignore,
            site_delay: Duration::from_secs(3),
            discovery_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteRunReport {
    pub source: String,
    pub extracted: usize,
    pub written: u64,
    pub skipped: u64,
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub extracted: usize,
    pub written: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub sites: Vec<SiteRunReport>,
    pub discovery: Option<SiteRunReport>,
}

impl CycleReport {
    pub fn written(&self) -> u64 {
        self.sites
            .iter()
            .chain(self.discovery.iter())
            .map(|r| r.written)
            .sum()
    }
}

pub struct Pipeline {
    store: Arc<dyn JobStore>,
    providers: ProviderChain,
    pages: Arc<dyn PageSource>,
    sites: Vec<SiteConfig>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        providers: ProviderChain,
        pages: Arc<dyn PageSource>,
        sites: Vec<SiteConfig>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            providers,
            pages,
            sites,
            settings,
        }
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    /// Configured enrichment providers, in chain order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.configured_names()
    }

    /// Normalize, enrich and upsert postings that already passed the extractor filter.
    pub async fn process(&self, raw: Vec<RawPosting>) -> Result<UpsertReport, UpsertError> {
        if raw.is_empty() {
            return Ok(UpsertReport::default());
        }
        let normalized = raw.into_iter().map(normalize).collect();
        let enriched = enrich_batch(normalized, &self.providers, self.settings.batch).await;
        upsert(&self.store, &enriched, self.settings.conflict).await
    }

    /// Postings pushed by external scrapers. Entries failing the extractor's hard
    /// filter are dropped and counted as skipped.
    pub async fn ingest(&self, raw: Vec<RawPosting>) -> Result<IngestReport, UpsertError> {
        let submitted = raw.len();
        let valid: Vec<RawPosting> = raw.into_iter().filter_map(keep_valid).collect();
        let extracted = valid.len();
        let report = self.process(valid).await?;
        Ok(IngestReport {
            extracted,
            written: report.written,
            skipped: report.skipped + (submitted - extracted) as u64,
        })
    }

    pub async fn run_site(&self, site: &SiteConfig) -> SiteRunReport {
        let urls = site.page_urls();
        let mut raw = Vec::new();
        let mut fetched_pages = 0usize;

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            match self.pages.fetch_page(url).await {
                Ok(html) => {
                    fetched_pages += 1;
                    let found = extract(SourceConfig::Site(site), SourceDocument::Html(&html));
                    info!("{} page {}: {} postings", site.name, i + 1, found.len());
                    raw.extend(found);
                }
                Err(e) => warn!("{} page {} failed: {e}", site.name, i + 1),
            }
        }

        let mut report = SiteRunReport {
            source: site.source.clone(),
            extracted: raw.len(),
            failed: fetched_pages == 0,
            ..SiteRunReport::default()
        };

        match self.process(raw).await {
            Ok(outcome) => {
                report.written = outcome.written;
                report.skipped = outcome.skipped;
            }
            Err(e) => {
                warn!("{}: {e}", site.name);
                report.failed = true;
            }
        }

        info!(
            "{} done: {} extracted, {} written, {} skipped",
            site.name, report.extracted, report.written, report.skipped
        );
        report
    }

    /// AI discovery run. `None` when no provider produced postings.
    pub async fn run_discovery(&self) -> Option<SiteRunReport> {
        let found = discover(&self.providers, &self.sites).await?;
        let mut report = SiteRunReport {
            source: found.provider,
            extracted: found.postings.len(),
            ..SiteRunReport::default()
        };
        match self.process(found.postings).await {
            Ok(outcome) => {
                report.written = outcome.written;
                report.skipped = outcome.skipped;
            }
            Err(e) => {
                warn!("discovery via {}: {e}", report.source);
                report.failed = true;
            }
        }
        Some(report)
    }

    /// Every site in order, then discovery when enabled.
    pub async fn run_cycle(&self) -> CycleReport {
        info!("Scraping cycle started ({} sites)", self.sites.len());
        let mut cycle = CycleReport::default();

        for (i, site) in self.sites.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            cycle.sites.push(self.run_site(site).await);
        }

        if self.settings.discovery_enabled {
            cycle.discovery = self.run_discovery().await;
        }

        let failed = cycle.sites.iter().filter(|r| r.failed).count();
        info!(
            "Scraping cycle finished: {} written, {} of {} sites failed",
            cycle.written(),
            failed,
            cycle.sites.len()
        );
        cycle
    }

    async fn pause(&self) {
        if !self.settings.site_delay.is_zero() {
            tokio::time::sleep(self.settings.site_delay).await;
        }
    }
}

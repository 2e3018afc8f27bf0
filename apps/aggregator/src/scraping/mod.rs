//! Everything that talks to job sites: the site registry, the HTTP fetcher and
//! AI-driven discovery.

pub mod discovery;
pub mod fetcher;
pub mod prompts;
pub mod sites;

pub use fetcher::{LinkProbe, LinkStatus, PageSource, SiteFetcher};
pub use sites::SiteConfig;

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::scraping::LinkProbe;
use crate::store::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub pipeline: Arc<Pipeline>,
    /// Used by the availability sweep. Default: the site fetcher's HEAD requests.
    pub link_probe: Arc<dyn LinkProbe>,
    pub config: Config,
}

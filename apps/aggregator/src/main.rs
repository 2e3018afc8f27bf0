mod config;
mod db;
mod errors;
mod maintenance;
mod models;
mod pipeline;
mod providers;
mod routes;
mod scheduler;
mod scraping;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::Pipeline;
use crate::providers::build_chain;
use crate::routes::build_router;
use crate::scraping::sites::{builtin_sites, load_sites};
use crate::scraping::SiteFetcher;
use crate::state::AppState;
use crate::store::{JobStore, PgJobStore};

#[derive(Parser)]
#[command(name = "aggregator", about = "Moroccan job aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// HTTP API plus the periodic scraper (default)
    Serve,
    /// Run one scraping cycle and exit
    ScrapeOnce,
    /// Delete rows older than the retention horizon and exit
    Sweep {
        /// Override RETENTION_DAYS
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job aggregator v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.store_timeout).await?;
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db, config.store_timeout));

    if let Some(Commands::Sweep { days }) = cli.command {
        let days = days.unwrap_or(config.retention_days);
        let deleted = maintenance::retention_sweep(store.as_ref(), days, chrono::Utc::now()).await?;
        info!("Sweep finished: {deleted} rows deleted");
        return Ok(());
    }

    // AI providers share one client with the configured timeout
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let providers = build_chain(&config, &http);
    if providers.has_configured() {
        info!("Enrichment providers: {}", providers.configured_names().join(" -> "));
    } else {
        info!("No enrichment provider configured, using rule-based enrichment only");
    }

    let fetcher = Arc::new(SiteFetcher::new(config.http_timeout)?);
    let sites = match &config.sites_file {
        Some(path) => load_sites(path)?,
        None => builtin_sites(),
    };
    info!("Site registry: {} sites", sites.len());

    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        providers,
        fetcher.clone(),
        sites,
        config.pipeline_settings(),
    ));
    let retention_days = config
        .retention_sweep_enabled
        .then_some(config.retention_days);

    if let Some(Commands::ScrapeOnce) = cli.command {
        let cycle = scheduler::run_scheduled_cycle(&pipeline, store.as_ref(), retention_days).await;
        info!("Scrape finished: {} jobs written", cycle.written());
        return Ok(());
    }

    match config.scrape_interval {
        Some(every) => {
            tokio::spawn(scheduler::run_forever(
                pipeline.clone(),
                store.clone(),
                every,
                retention_days,
            ));
        }
        None => info!("Scheduler disabled (SCRAPE_INTERVAL_MINUTES=0)"),
    }

    // Build app state
    let state = AppState {
        store,
        pipeline,
        link_probe: fetcher,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

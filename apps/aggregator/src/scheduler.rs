//! Fixed-interval scraping loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::maintenance::retention_sweep;
use crate::pipeline::runner::CycleReport;
use crate::pipeline::Pipeline;
use crate::store::JobStore;

/// One full cycle, followed by the retention sweep when `retention_days` is set.
/// A failed sweep is logged and retried on the next cycle.
pub async fn run_scheduled_cycle(
    pipeline: &Pipeline,
    store: &dyn JobStore,
    retention_days: Option<u32>,
) -> CycleReport {
    let cycle = pipeline.run_cycle().await;

    if let Some(days) = retention_days {
        if let Err(e) = retention_sweep(store, days, Utc::now()).await {
            warn!("Retention sweep failed: {e}");
        }
    }

    cycle
}

/// Runs a cycle immediately, then once every `every`. A cycle that overruns the
/// interval pushes the next one back instead of starting a burst of catch-up runs.
pub async fn run_forever(
    pipeline: Arc<Pipeline>,
    store: Arc<dyn JobStore>,
    every: Duration,
    retention_days: Option<u32>,
) {
    info!("Scheduler started: every {}s", every.as_secs());

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_scheduled_cycle(&pipeline, store.as_ref(), retention_days).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::maintenance::tests::new_job;
    use crate::pipeline::runner::tests::{site, FakePages};
    use crate::pipeline::PipelineSettings;
    use crate::providers::ProviderChain;
    use crate::store::memory::MemoryJobStore;

    fn pipeline(store: Arc<MemoryJobStore>, pages: Arc<FakePages>) -> Pipeline {
        Pipeline::new(
            store,
            ProviderChain::default(),
            pages,
            vec![site("a.ma", 1)],
            PipelineSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_then_retention() {
        let store = Arc::new(MemoryJobStore::new());
        store.insert_at(new_job("old", None), Utc::now() - ChronoDuration::days(11));
        store.insert_at(new_job("fresh", None), Utc::now() - ChronoDuration::days(2));
        let p = pipeline(store.clone(), Arc::new(FakePages::default()));

        let cycle = run_scheduled_cycle(&p, store.as_ref(), Some(10)).await;

        assert_eq!(cycle.sites.len(), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retention_disabled_keeps_rows() {
        let store = Arc::new(MemoryJobStore::new());
        store.insert_at(new_job("old", None), Utc::now() - ChronoDuration::days(30));
        let p = pipeline(store.clone(), Arc::new(FakePages::default()));

        run_scheduled_cycle(&p, store.as_ref(), None).await;

        assert!(store.get("old").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately_then_on_interval() {
        let store = Arc::new(MemoryJobStore::new());
        let pages = Arc::new(FakePages::default());
        let p = Arc::new(pipeline(store.clone(), pages.clone()));

        let run = run_forever(p, store, Duration::from_secs(60), None);
        let _ = tokio::time::timeout(Duration::from_secs(150), run).await;

        // Cycles at 0s, 60s and 120s
        assert_eq!(pages.requested().len(), 3);
    }
}

//! Out-of-band cleanup of the jobs table.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::scraping::{LinkProbe, LinkStatus};
use crate::store::{JobStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub checked: usize,
    pub deleted: usize,
    /// Links that could not be verified this time; their rows are kept.
    pub inconclusive: usize,
}

/// Deletes rows created more than `retention_days` before `now`.
pub async fn retention_sweep(
    store: &dyn JobStore,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Result<u64, StoreError> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let deleted = store.delete_older_than(cutoff).await?;
    info!("Retention sweep: deleted {deleted} jobs older than {retention_days} days");
    Ok(deleted)
}

/// Checks the URL of every listed row and deletes the rows whose link is dead. Rows
/// keyed by content hash have no link and are left alone, and so are rows whose
/// check was inconclusive.
pub async fn availability_sweep(
    store: &dyn JobStore,
    probe: &dyn LinkProbe,
    since: DateTime<Utc>,
) -> Result<AvailabilityReport, StoreError> {
    let rows = store.list_since(since).await?;
    let mut report = AvailabilityReport::default();

    for row in rows {
        let Some(url) = row.url.as_deref() else {
            continue;
        };
        report.checked += 1;
        match probe.check(url).await {
            LinkStatus::Alive => continue,
            LinkStatus::Inconclusive => {
                report.inconclusive += 1;
                continue;
            }
            LinkStatus::Dead => {}
        }
        debug!("Dead link {url}, removing '{}'", row.title);
        if store.delete_by_key(&row.identity_key).await? {
            report.deleted += 1;
        }
    }

    info!(
        "Availability sweep: {} checked, {} deleted, {} inconclusive",
        report.checked, report.deleted, report.inconclusive
    );
    Ok(report)
}

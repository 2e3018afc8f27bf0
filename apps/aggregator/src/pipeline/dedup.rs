//! Deduplicator / upsert gateway.
//!
//! Every posting gets exactly one identity key: its source URL when usable, otherwise
//! a SHA-256 of title, company and the rule-detected city. The store enforces uniqueness on that key, so
//! writing the same posting again never adds a row.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::job::NewJob;
use crate::models::posting::EnrichedPosting;
use crate::pipeline::extractor::usable_url;
use crate::store::{ConflictPolicy, JobStore, StoreError};

pub const HASH_KEY_PREFIX: &str = "sha256:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub written: u64,
    pub skipped: u64,
}

/// The batch write failed as a whole. Per-row outcomes are unknown.
#[derive(Debug, Error)]
#[error("upsert of {attempted} postings failed: {source}")]
pub struct UpsertError {
    pub attempted: usize,
    #[source]
    pub source: StoreError,
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Stable identity of a posting, or `None` when it has neither a usable URL nor a
/// title to hash.
pub fn identity_key(enriched: &EnrichedPosting) -> Option<String> {
    let posting = &enriched.posting;
    if let Some(url) = usable_url(posting.source_url.as_deref()) {
        return Some(url);
    }

    let title = fold(&posting.title);
    let company = fold(posting.company.as_deref().unwrap_or(""));
    if title.is_empty() || company.is_empty() {
        return None;
    }
    let city = fold(&posting.rule_city);

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(company.as_bytes());
    hasher.update(b"|");
    hasher.update(city.as_bytes());
    Some(format!("{HASH_KEY_PREFIX}{:x}", hasher.finalize()))
}

/// Keys every posting, drops the unkeyable ones and collapses duplicates inside the
/// batch. With `Ignore` the first occurrence of a key wins, with `Overwrite` the last.
pub fn prepare_batch(
    postings: &[EnrichedPosting],
    policy: ConflictPolicy,
) -> (Vec<NewJob>, u64) {
    let mut jobs: Vec<NewJob> = Vec::with_capacity(postings.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0;

    for posting in postings {
        let Some(key) = identity_key(posting) else {
            debug!("Rejected '{}': no identity key", posting.posting.title);
            skipped += 1;
            continue;
        };
        match index.get(&key) {
            Some(&at) => {
                skipped += 1;
                if policy == ConflictPolicy::Overwrite {
                    jobs[at] = NewJob::from_enriched(key, posting);
                }
            }
            None => {
                index.insert(key.clone(), jobs.len());
                jobs.push(NewJob::from_enriched(key, posting));
            }
        }
    }
    (jobs, skipped)
}

/// Writes the batch in one store call. `skipped` counts rejected postings, in-batch
/// duplicates and rows the store left untouched because the key already existed.
pub async fn upsert(
    store: &Arc<dyn JobStore>,
    postings: &[EnrichedPosting],
    policy: ConflictPolicy,
) -> Result<UpsertReport, UpsertError> {
    let (jobs, rejected) = prepare_batch(postings, policy);
    if jobs.is_empty() {
        return Ok(UpsertReport {
            written: 0,
            skipped: rejected,
        });
    }

    let attempted = jobs.len();
    match store.upsert_batch(&jobs, policy).await {
        Ok(written) => {
            let report = UpsertReport {
                written,
                skipped: rejected + (attempted as u64).saturating_sub(written),
            };
            debug!(
                "Upserted batch: {} written, {} skipped",
                report.written, report.skipped
            );
            Ok(report)
        }
        Err(source) => {
            warn!("Upsert of {attempted} postings failed: {source}");
            Err(UpsertError { attempted, source })
        }
    }
}

//! Jobs store. The pipeline only talks to `JobStore`; Postgres is one implementation.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::job::{JobRecord, NewJob};

#[cfg(test)]
pub mod memory;
pub mod pg;

pub use pg::PgJobStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

/// What a write does when a row with the same identity key already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    Ignore,
    /// Replace every column except `id` and `created_at`.
    Overwrite,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ConflictPolicy::Ignore),
            "overwrite" | "update" => Ok(ConflictPolicy::Overwrite),
            other => Err(format!("unknown conflict policy '{other}'")),
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Writes `jobs` keyed on `identity_key`. Returns the number of rows inserted or
    /// updated. Callers must not pass two rows with the same key in one batch.
    async fn upsert_batch(&self, jobs: &[NewJob], policy: ConflictPolicy)
        -> Result<u64, StoreError>;

    /// Rows created after `since`, newest first.
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<JobRecord>, StoreError>;

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn delete_by_key(&self, identity_key: &str) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_policy_from_str() {
        assert_eq!("ignore".parse(), Ok(ConflictPolicy::Ignore));
        assert_eq!(" Overwrite ".parse(), Ok(ConflictPolicy::Overwrite));
        assert!("merge".parse::<ConflictPolicy>().is_err());
    }

    #[test]
    fn test_conflict_policy_default_is_ignore() {
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Ignore);
    }
}

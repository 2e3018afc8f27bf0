//! In-memory `JobStore` for tests. Mirrors the Postgres conflict semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ConflictPolicy, JobStore, StoreError};
use crate::models::job::{JobRecord, NewJob};

#[derive(Default)]
pub struct MemoryJobStore {
    rows: Mutex<HashMap<String, JobRecord>>,
    upsert_calls: AtomicUsize,
    fail_writes: bool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, as if the database were unreachable.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Inserts a row with an explicit creation time.
    pub fn insert_at(&self, job: NewJob, created_at: DateTime<Utc>) {
        let key = job.identity_key.clone();
        self.rows
            .lock()
            .unwrap()
            .insert(key, job.into_record(Uuid::new_v4(), created_at));
    }

    pub fn get(&self, identity_key: &str) -> Option<JobRecord> {
        self.rows.lock().unwrap().get(identity_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn upsert_batch(
        &self,
        jobs: &[NewJob],
        policy: ConflictPolicy,
    ) -> Result<u64, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut written = 0;
        for job in jobs {
            match rows.get_mut(&job.identity_key) {
                Some(existing) => {
                    if policy == ConflictPolicy::Overwrite {
                        *existing = job.clone().into_record(existing.id, existing.created_at);
                        written += 1;
                    }
                }
                None => {
                    rows.insert(
                        job.identity_key.clone(),
                        job.clone().into_record(Uuid::new_v4(), Utc::now()),
                    );
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<JobRecord>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut listed: Vec<JobRecord> = rows
            .values()
            .filter(|r| r.created_at >= since)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_key(&self, identity_key: &str) -> Result<bool, StoreError> {
        Ok(self.rows.lock().unwrap().remove(identity_key).is_some())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

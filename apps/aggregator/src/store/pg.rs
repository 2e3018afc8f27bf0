use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{ConflictPolicy, JobStore, StoreError};
use crate::models::job::{JobRecord, NewJob};

/// Postgres binds at most 65535 parameters per statement; 16 columns per row.
const MAX_ROWS_PER_STATEMENT: usize = 1000;

const INSERT_COLUMNS: &str = "INSERT INTO jobs (id, identity_key, url, title, company, city, \
     description, contract_type, salary, company_email, company_phone, company_website, \
     category, skills, summary, source) ";

const ON_CONFLICT_UPDATE: &str = " ON CONFLICT (identity_key) DO UPDATE SET \
     url = EXCLUDED.url, title = EXCLUDED.title, company = EXCLUDED.company, \
     city = EXCLUDED.city, description = EXCLUDED.description, \
     contract_type = EXCLUDED.contract_type, salary = EXCLUDED.salary, \
     company_email = EXCLUDED.company_email, company_phone = EXCLUDED.company_phone, \
     company_website = EXCLUDED.company_website, category = EXCLUDED.category, \
     skills = EXCLUDED.skills, summary = EXCLUDED.summary, source = EXCLUDED.source";

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
    /// Client-side bound on each call, on top of the server's `statement_timeout`.
    timeout: Duration,
}

impl PgJobStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

fn build_upsert<'a>(jobs: &'a [NewJob], policy: ConflictPolicy) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(INSERT_COLUMNS);
    qb.push_values(jobs, |mut row, job| {
        row.push_bind(Uuid::new_v4())
            .push_bind(&job.identity_key)
            .push_bind(&job.url)
            .push_bind(&job.title)
            .push_bind(&job.company)
            .push_bind(&job.city)
            .push_bind(&job.description)
            .push_bind(&job.contract_type)
            .push_bind(&job.salary)
            .push_bind(&job.company_email)
            .push_bind(&job.company_phone)
            .push_bind(&job.company_website)
            .push_bind(&job.category)
            .push_bind(&job.skills)
            .push_bind(&job.summary)
            .push_bind(&job.source);
    });
    match policy {
        ConflictPolicy::Ignore => qb.push(" ON CONFLICT (identity_key) DO NOTHING"),
        ConflictPolicy::Overwrite => qb.push(ON_CONFLICT_UPDATE),
    };
    qb
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn upsert_batch(
        &self,
        jobs: &[NewJob],
        policy: ConflictPolicy,
    ) -> Result<u64, StoreError> {
        let mut written = 0;
        for chunk in jobs.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut qb = build_upsert(chunk, policy);
            let result = bounded(self.timeout, qb.build().execute(&self.pool)).await?;
            written += result.rows_affected();
        }
        debug!("Upserted {written}/{} job rows ({policy:?})", jobs.len());
        Ok(written)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<JobRecord>, StoreError> {
        let query = sqlx::query_as::<_, JobRecord>(
            "SELECT * FROM jobs WHERE created_at >= $1 ORDER BY created_at DESC",
        )
        .bind(since);
        bounded(self.timeout, query.fetch_all(&self.pool)).await
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let query = sqlx::query("DELETE FROM jobs WHERE created_at < $1").bind(cutoff);
        let result = bounded(self.timeout, query.execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_key(&self, identity_key: &str) -> Result<bool, StoreError> {
        let query = sqlx::query("DELETE FROM jobs WHERE identity_key = $1").bind(identity_key);
        let result = bounded(self.timeout, query.execute(&self.pool)).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let query = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs");
        bounded(self.timeout, query.fetch_one(&self.pool)).await
    }
}

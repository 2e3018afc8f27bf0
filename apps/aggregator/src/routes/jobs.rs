use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobRecord;
use crate::models::posting::{Category, ContractType, RawPosting};
use crate::pipeline::runner::IngestReport;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IngestRequest {
    pub postings: Vec<RawPosting>,
}

/// A stored row plus the French labels the listing shows.
#[derive(Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobRecord,
    pub contract_label: &'static str,
    pub category_label: &'static str,
}

impl From<JobRecord> for JobView {
    fn from(job: JobRecord) -> Self {
        let contract = ContractType::from_stored(&job.contract_type).unwrap_or_default();
        let category = Category::parse(&job.category).unwrap_or_default();
        Self {
            contract_label: contract.label(),
            category_label: category.label(),
            job,
        }
    }
}

/// GET /api/v1/jobs
/// Every non-expired job, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobView>>, AppError> {
    let since = Utc::now() - Duration::days(i64::from(state.config.listing_max_age_days));
    let jobs = state.store.list_since(since).await?;
    Ok(Json(jobs.into_iter().map(JobView::from).collect()))
}

/// POST /api/v1/jobs/ingest
pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestReport>, AppError> {
    if req.postings.is_empty() {
        return Err(AppError::Validation("postings must not be empty".to_string()));
    }
    let report = state.pipeline.ingest(req.postings).await?;
    Ok(Json(report))
}

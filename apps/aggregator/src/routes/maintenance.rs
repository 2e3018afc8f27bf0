use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::maintenance::{availability_sweep, retention_sweep, AvailabilityReport};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RetentionResponse {
    pub deleted: u64,
}

/// POST /api/v1/maintenance/retention
pub async fn handle_retention(
    State(state): State<AppState>,
) -> Result<Json<RetentionResponse>, AppError> {
    let deleted = retention_sweep(&*state.store, state.config.retention_days, Utc::now()).await?;
    Ok(Json(RetentionResponse { deleted }))
}

/// POST /api/v1/maintenance/availability
pub async fn handle_availability(
    State(state): State<AppState>,
) -> Result<Json<AvailabilityReport>, AppError> {
    let since = Utc::now() - Duration::days(i64::from(state.config.listing_max_age_days));
    let report = availability_sweep(&*state.store, &*state.link_probe, since).await?;
    Ok(Json(report))
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Service version, stored job count and the providers the enricher will try.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let jobs = state.store.count().await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "aggregator",
        "jobs": jobs,
        "providers": state.pipeline.provider_names(),
        "sites": state.pipeline.sites().len()
    })))
}

pub mod health;
pub mod jobs;
pub mod maintenance;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Read contract consumed by the front-end
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        // Postings pushed by external scrapers
        .route("/api/v1/jobs/ingest", post(jobs::handle_ingest))
        .route(
            "/api/v1/maintenance/retention",
            post(maintenance::handle_retention),
        )
        .route(
            "/api/v1/maintenance/availability",
            post(maintenance::handle_availability),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::maintenance::tests::{new_job, FakeProbe};
    use crate::pipeline::runner::tests::FakePages;
    use crate::pipeline::Pipeline;
    use crate::providers::ProviderChain;
    use crate::store::memory::MemoryJobStore;

    fn app(store: Arc<MemoryJobStore>, probe: FakeProbe) -> Router {
        let config = Config::for_tests();
        let pipeline = Pipeline::new(
            store.clone(),
            ProviderChain::default(),
            Arc::new(FakePages::default()),
            Vec::new(),
            config.pipeline_settings(),
        );
        build_router(AppState {
            store,
            pipeline: Arc::new(pipeline),
            link_probe: Arc::new(probe),
            config,
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(MemoryJobStore::new()), FakeProbe::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["jobs"], 0);
        assert_eq!(body["providers"], json!([]));
    }

    #[tokio::test]
    async fn test_ingest_then_list() {
        let store = Arc::new(MemoryJobStore::new());
        let app = app(store.clone(), FakeProbe::default());
        let posting = json!({
            "url": "https://x.ma/job/42",
            "title": "Comptable",
            "company": "X",
            "city": "Rabat",
            "job_type": "CDI"
        });

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/api/v1/jobs/ingest",
                    json!({ "postings": [posting.clone(), {"title": ""}] }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(store.len(), 1);

        let response = app
            .oneshot(Request::builder().uri("/api/v1/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let jobs = json_body(response).await;
        assert_eq!(jobs.as_array().unwrap().len(), 1);
        assert_eq!(jobs[0]["url"], "https://x.ma/job/42");
        assert_eq!(jobs[0]["city"], "Rabat");
        assert_eq!(jobs[0]["contract_type"], "CDI");
        assert_eq!(jobs[0]["category"], "Finance");
        assert_eq!(jobs[0]["contract_label"], "CDI");
        assert_eq!(jobs[0]["category_label"], "Finance & Administration");
    }

    #[tokio::test]
    async fn test_ingest_report_counts() {
        let app = app(Arc::new(MemoryJobStore::new()), FakeProbe::default());
        let response = app
            .oneshot(post_json(
                "/api/v1/jobs/ingest",
                json!({ "postings": [
                    {"title": "Développeur", "company": "Acme", "city": "Rabat"},
                    {"title": "Développeur", "company": "Acme", "city": "Casablanca"},
                    {"title": "Sans identité"}
                ]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"extracted": 2, "written": 2, "skipped": 1})
        );
    }

    #[tokio::test]
    async fn test_ingest_accepts_numeric_salary() {
        let store = Arc::new(MemoryJobStore::new());
        let response = app(store.clone(), FakeProbe::default())
            .oneshot(post_json(
                "/api/v1/jobs/ingest",
                json!({ "postings": [
                    {"url": "https://x.ma/job/7", "title": "Comptable", "company": "X", "salary": 8000}
                ]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.get("https://x.ma/job/7").unwrap().salary.as_deref(), Some("8000"));
    }

    #[tokio::test]
    async fn test_ingest_empty_is_rejected() {
        let response = app(Arc::new(MemoryJobStore::new()), FakeProbe::default())
            .oneshot(post_json("/api/v1/jobs/ingest", json!({ "postings": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_hides_expired_rows() {
        let store = Arc::new(MemoryJobStore::new());
        store.insert_at(new_job("old", Some("https://x.ma/old")), Utc::now() - Duration::days(8));
        store.insert_at(new_job("new", Some("https://x.ma/new")), Utc::now());

        let response = app(store, FakeProbe::default())
            .oneshot(Request::builder().uri("/api/v1/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let jobs = json_body(response).await;
        assert_eq!(jobs.as_array().unwrap().len(), 1);
        assert_eq!(jobs[0]["identity_key"], "new");
    }

    #[tokio::test]
    async fn test_retention_endpoint() {
        let store = Arc::new(MemoryJobStore::new());
        store.insert_at(new_job("old", None), Utc::now() - Duration::days(11));
        store.insert_at(new_job("fresh", None), Utc::now() - Duration::days(2));

        let response = app(store.clone(), FakeProbe::default())
            .oneshot(post_empty("/api/v1/maintenance/retention"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"deleted": 1}));
        assert!(store.get("fresh").is_some());
    }

    #[tokio::test]
    async fn test_availability_endpoint() {
        let store = Arc::new(MemoryJobStore::new());
        store.insert_at(new_job("https://x.ma/a", Some("https://x.ma/a")), Utc::now());
        store.insert_at(new_job("https://x.ma/b", Some("https://x.ma/b")), Utc::now());
        let probe = FakeProbe {
            dead: HashSet::from(["https://x.ma/b".to_string()]),
            ..FakeProbe::default()
        };

        let response = app(store.clone(), probe)
            .oneshot(post_empty("/api/v1/maintenance/availability"))
            .await
            .unwrap();

        assert_eq!(json_body(response).await, json!({"checked": 2, "deleted": 1, "inconclusive": 0}));
        assert_eq!(store.len(), 1);
    }
}

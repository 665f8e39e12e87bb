//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_invalidate_handler, cache_stats_handler, cancel_job_handler, delete_job_handler,
    download_handler, export_files_handler, export_handler, get_job_handler, health_handler,
    list_jobs_handler, scrape_profile_handler, scrape_repos_handler, stats_handler,
    submit_job_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /scrape/profile/:username` - Cache-backed profile read
/// - `GET /scrape/repos/:username` - Cache-backed repository listing
/// - `POST /scrape/async/:username` - Submit a background scrape job
/// - `GET /jobs` / `GET /jobs/:id` - Job queries
/// - `POST /jobs/:id/cancel` / `DELETE /jobs/:id` - Job control
/// - `POST /export/:id/:format` - Produce export files
/// - `GET /export/:id/files` - List a job's export files
/// - `GET /download/:id/:filename` - Download an export file
/// - `DELETE /cache/:key` / `GET /cache/stats` - Cache administration
/// - `GET /stats` / `GET /health` - Process observability
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scrape/profile/:username", get(scrape_profile_handler))
        .route("/scrape/repos/:username", get(scrape_repos_handler))
        .route("/scrape/async/:username", post(submit_job_handler))
        .route("/jobs", get(list_jobs_handler))
        .route(
            "/jobs/:id",
            get(get_job_handler).delete(delete_job_handler),
        )
        .route("/jobs/:id/cancel", post(cancel_job_handler))
        .route("/export/:id/files", get(export_files_handler))
        .route("/export/:id/:format", post(export_handler))
        .route("/download/:id/:filename", get(download_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/:key", delete(cache_invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::config::Config;

    fn create_test_app() -> Router {
        let config = Config::default();
        let state = AppState::from_config(&config).unwrap();
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_job_returns_404() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/jobs/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_job_id_is_rejected() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/jobs/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cache_invalidate_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache/some-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

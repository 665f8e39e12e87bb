//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles: job submission and polling over the
//! router, export production and download, cache administration, and the
//! wiremock-backed synchronous scrape paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hubscrape::api::{create_router, AppState};
use hubscrape::cache::CacheStore;
use hubscrape::config::Config;
use hubscrape::export::{ExportCoordinator, Exporter};
use hubscrape::jobs::{JobContext, JobManager, Scraper};
use hubscrape::scrape::{GithubClient, ScrapeError, ScrapeParams, ScrapeReport, UserProfile};

// == Helper Functions ==

/// Stub scrape operation that completes instantly with a small report.
struct StubScraper;

#[async_trait]
impl Scraper for StubScraper {
    async fn scrape(
        &self,
        subject: &str,
        params: &ScrapeParams,
        _ctx: &JobContext,
    ) -> Result<Value, ScrapeError> {
        let profile: UserProfile = serde_json::from_value(json!({
            "login": subject,
            "html_url": format!("https://github.com/{}", subject)
        }))
        .expect("static profile");
        let repos = (0..params.max_repos.min(5))
            .map(|i| {
                serde_json::from_value(json!({
                    "name": format!("repo{}", i),
                    "stargazers_count": i
                }))
                .expect("static repo")
            })
            .collect();
        let report = ScrapeReport::new(subject.to_string(), profile, repos);
        Ok(serde_json::to_value(report)?)
    }
}

fn stub_app(config: &Config) -> Router {
    let client = Arc::new(GithubClient::new(config).unwrap());
    let jobs = Arc::new(JobManager::new(Arc::new(StubScraper), config));
    let export = Arc::new(ExportCoordinator::new(
        jobs.clone(),
        Exporter::new(config.output_dir.clone()),
    ));
    let state = AppState::new(
        CacheStore::new(config.cache_max_entries, config.cache_ttl),
        jobs,
        export,
        client,
        config.default_max_repos,
    );
    create_router(state)
}

fn create_test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    (stub_app(&config), dir)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn wait_for_job_status(app: &Router, job_id: &str, expected: &str) -> Value {
    for _ in 0..300 {
        let (status, body) = get_json(app, &format!("/jobs/{job_id}")).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == expected {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never became {expected}");
}

// == Health & Stats ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = create_test_app();

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_jobs"], 0);
    assert!(body.get("timestamp").is_some());
}

#[tokio::test]
async fn test_stats_endpoint_shape() {
    let (app, _dir) = create_test_app();

    let (status, body) = get_json(&app, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["hits"], 0);
    assert_eq!(body["cache"]["hit_rate"], 0.0);
    assert_eq!(body["jobs"]["total"], 0);
}

// == Async Job Flow ==

#[tokio::test]
async fn test_async_scrape_full_lifecycle() {
    let (app, _dir) = create_test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat?max_repos=5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending");
    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert_eq!(body["status_url"], format!("/jobs/{job_id}"));

    let job = wait_for_job_status(&app, &job_id, "completed").await;
    assert_eq!(job["progress"], 100);
    assert_eq!(job["subject"], "octocat");
    assert_eq!(job["result"]["repositories"].as_array().unwrap().len(), 5);
    assert!(job["error"].is_null());
}

#[tokio::test]
async fn test_submit_rejects_invalid_max_repos() {
    let (app, _dir) = create_test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat?max_repos=0")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("max_repos"));
}

#[tokio::test]
async fn test_list_jobs_contains_submitted_job() {
    let (app, _dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&app, "/jobs").await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["job_id"], job_id.as_str());
}

#[tokio::test]
async fn test_list_jobs_filters_by_status() {
    let (app, _dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    wait_for_job_status(&app, &job_id, "completed").await;

    let (_, completed) = get_json(&app, "/jobs?status=completed").await;
    assert_eq!(completed.as_array().unwrap().len(), 1);

    let (_, failed) = get_json(&app, "/jobs?status=failed").await;
    assert!(failed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_completed_job_conflicts() {
    let (app, _dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    wait_for_job_status(&app, &job_id, "completed").await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/jobs/{job_id}/cancel"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn test_delete_job_then_404() {
    let (app, _dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    wait_for_job_status(&app, &job_id, "completed").await;

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/jobs/{job_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_json(&app, &format!("/jobs/{job_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Export Flow ==

#[tokio::test]
async fn test_export_and_download_flow() {
    let (app, dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    wait_for_job_status(&app, &job_id, "completed").await;

    // Produce a JSON export
    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/export/{job_id}/json"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["format"], "json");
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    let filename = files[0].as_str().unwrap().to_string();
    assert!(dir.path().join(&filename).exists());

    // Listed on the record
    let (status, body) = get_json(&app, &format!("/export/{job_id}/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_files"], 1);
    assert_eq!(body["files"][0], filename.as_str());

    // Downloadable
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/download/{job_id}/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains(&filename));
}

#[tokio::test]
async fn test_download_foreign_filename_is_404() {
    let (app, _dir) = create_test_app();

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/scrape/async/octocat")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    wait_for_job_status(&app, &job_id, "completed").await;

    // A filename the job never produced must not resolve
    let (status, body) = get_json(&app, &format!("/download/{job_id}/stolen.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("stolen.json"));
}

#[tokio::test]
async fn test_export_unknown_format_is_rejected() {
    let (app, _dir) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/export/00000000-0000-0000-0000-000000000000/xlsx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Cache Administration ==

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let (app, _dir) = create_test_app();

    let (status, body) = get_json(&app, "/cache/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_entries"], 0);
    assert_eq!(body["evictions"], 0);
}

#[tokio::test]
async fn test_cache_invalidate_absent_key_is_ok() {
    let (app, _dir) = create_test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/cache/profile:nobody")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);
}

// == Synchronous Scrape Paths (wiremock upstream) ==

async fn wiremock_app(server: &MockServer) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        github_api_url: server.uri(),
        output_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    (stub_app(&config), dir)
}

#[tokio::test]
async fn test_sync_profile_populates_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "name": "The Octocat",
            "followers": 4000,
            "html_url": "https://github.com/octocat"
        })))
        .expect(1) // second read must come from the cache
        .mount(&server)
        .await;

    let (app, _dir) = wiremock_app(&server).await;

    let (status, body) = get_json(&app, "/scrape/profile/octocat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(body["profile"]["login"], "octocat");

    let (status, body) = get_json(&app, "/scrape/profile/octocat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(body["profile"]["followers"], 4000);

    let (_, stats) = get_json(&app, "/cache/stats").await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
}

#[tokio::test]
async fn test_sync_profile_unknown_user_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (app, _dir) = wiremock_app(&server).await;

    let (status, body) = get_json(&app, "/scrape/profile/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_sync_repos_cached_by_max_repos() {
    let server = MockServer::start().await;
    let repos: Vec<Value> = (0..10)
        .map(|i| json!({ "name": format!("repo{}", i), "stargazers_count": i }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos))
        .mount(&server)
        .await;

    let (app, _dir) = wiremock_app(&server).await;

    let (status, body) = get_json(&app, "/scrape/repos/octocat?max_repos=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(body["total_repos"], 3);

    // Same cap hits the cache; a different cap is a distinct key
    let (_, body) = get_json(&app, "/scrape/repos/octocat?max_repos=3").await;
    assert_eq!(body["cached"], true);

    let (_, body) = get_json(&app, "/scrape/repos/octocat?max_repos=5").await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["total_repos"], 5);
}

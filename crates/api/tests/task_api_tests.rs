use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use simulator_api::create_app;
use simulator_core::{
    config::{ApiConfig, SimulationDefaults},
    models::{ProbeReport, TaskConfig},
    traits::ProbeExecutor,
};
use simulator_infrastructure::InMemoryTaskRepository;
use simulator_worker::TaskSupervisor;
use tower::ServiceExt;

struct AlwaysOk;

#[async_trait]
impl ProbeExecutor for AlwaysOk {
    async fn probe(&self, _config: &TaskConfig) -> ProbeReport {
        ProbeReport::success(200)
    }

    fn name(&self) -> &str {
        "always-ok"
    }
}

fn app_with_prefix(prefix: &str) -> Router {
    let supervisor = Arc::new(TaskSupervisor::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(AlwaysOk),
    ));
    let api_config = ApiConfig {
        path_prefix: prefix.to_string(),
        ..ApiConfig::default()
    };
    create_app(supervisor, SimulationDefaults::default(), &api_config)
}

fn app() -> Router {
    app_with_prefix("/api")
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test]
async fn test_create_with_defaults() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["url"], "http://example.com");
    assert_eq!(body["status"], "running");
    assert_eq!(body["min_interval"], 2);
    assert_eq!(body["max_interval"], 5);
    assert_eq!(body["count"], 10);
    assert_eq!(body["timeout"], 10);
    assert_eq!(body["retries"], 0);
    assert_eq!(body["retry_delay"], 1);
    assert_eq!(body["success_count"], 0);
    assert_eq!(body["fail_count"], 0);
    assert_eq!(body["results"], json!([]));
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_create_rejects_invalid_url() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "not a url" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_URL");
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let app = app();
    for payload in [
        json!({ "url": "example.com", "min_interval": 6, "max_interval": 5 }),
        json!({ "url": "example.com", "min_interval": 0 }),
        json!({ "url": "example.com", "count": 0 }),
        json!({ "url": "example.com", "timeout": 0 }),
        json!({ "url": "example.com", "retries": -1 }),
        json!({ "url": "example.com", "retry_delay": -1 }),
    ] {
        let (status, body) = send(&app, Method::POST, "/api/tasks", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(body["error"]["code"], "INVALID_CONFIG");
    }

    let (_, list) = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_rejects_malformed_body() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/tasks", Some(json!({ "count": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "example.com", "count": "many" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/tasks/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TASK_NOT_FOUND");

    let (status, _) = send(&app, Method::DELETE, "/api/tasks/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_newest_first_with_status_filter() {
    let app = app();
    let (_, first) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "first.com", "min_interval": 60, "max_interval": 60 })),
    )
    .await;
    let (_, second) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "second.com", "min_interval": 60, "max_interval": 60 })),
    )
    .await;

    let (status, list) = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![second["id"].as_str().unwrap(), first["id"].as_str().unwrap()]
    );
    assert!(list[0].get("results").is_none());

    let (_, running) = send(&app, Method::GET, "/api/tasks?status=running", None).await;
    assert_eq!(running.as_array().unwrap().len(), 2);

    let (_, completed) = send(&app, Method::GET, "/api/tasks?status=completed", None).await;
    assert_eq!(completed, json!([]));

    let (status, _) = send(&app, Method::GET, "/api/tasks?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_task_lifecycle() {
    let app = app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "url": "localhost:9", "min_interval": 1, "max_interval": 1, "count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

    tokio::time::sleep(Duration::from_secs(5)).await;

    let (status, detail) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "completed");
    assert_eq!(detail["success_count"], 2);
    assert_eq!(detail["fail_count"], 0);
    let results = detail["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["status_code"], 200);
    assert_eq!(results[0]["message"], "成功 - 状态码: 200");

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_routes_follow_path_prefix() {
    let prefixed = app();
    let (status, _) = send(&prefixed, Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bare = app_with_prefix("");
    let (status, list) = send(&bare, Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

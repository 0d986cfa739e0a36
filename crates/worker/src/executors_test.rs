use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::get,
    Router,
};
use simulator_core::{
    models::{ProbeOutcome, TaskConfig},
    traits::ProbeExecutor,
};

use crate::executors::HttpProbeExecutor;
use crate::user_agents::USER_AGENTS;

#[derive(Clone, Default)]
struct Hits {
    count: Arc<AtomicU32>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

async fn serve() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/ok",
            get(|State(hits): State<Hits>, headers: HeaderMap| async move {
                hits.count.fetch_add(1, Ordering::SeqCst);
                if let Some(ua) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
                    hits.user_agents.lock().unwrap().push(ua.to_string());
                }
                "hello"
            }),
        )
        .route(
            "/missing",
            get(|State(hits): State<Hits>| async move {
                hits.count.fetch_add(1, Ordering::SeqCst);
                StatusCode::NOT_FOUND
            }),
        )
        .route(
            "/boom",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/slow",
            get(|State(hits): State<Hits>| async move {
                hits.count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        )
        .route("/moved", get(|| async { Redirect::temporary("/ok") }))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn config(url: String, timeout: u32, retries: u32) -> TaskConfig {
    TaskConfig {
        url,
        min_interval: 1,
        max_interval: 1,
        count: 1,
        timeout,
        retries,
        retry_delay: 0,
    }
}

#[tokio::test]
async fn test_success_reports_status_code() {
    let (addr, hits) = serve().await;
    let executor = HttpProbeExecutor::new().unwrap();

    let report = executor
        .probe(&config(format!("http://{addr}/ok"), 5, 0))
        .await;

    assert_eq!(report.outcome, ProbeOutcome::Success);
    assert_eq!(report.status_code, 200);
    assert_eq!(report.message, "成功 - 状态码: 200");
    assert_eq!(hits.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sends_browser_user_agent() {
    let (addr, hits) = serve().await;
    let executor = HttpProbeExecutor::new().unwrap();

    for _ in 0..3 {
        executor
            .probe(&config(format!("http://{addr}/ok"), 5, 0))
            .await;
    }

    let seen = hits.user_agents.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|ua| USER_AGENTS.contains(&ua.as_str())));
}

#[tokio::test]
async fn test_http_error_is_terminal() {
    let (addr, hits) = serve().await;
    let executor = HttpProbeExecutor::new().unwrap();

    let report = executor
        .probe(&config(format!("http://{addr}/missing"), 5, 2))
        .await;

    assert_eq!(report.outcome, ProbeOutcome::Failure);
    assert_eq!(report.status_code, 404);
    assert_eq!(report.message, "失败 - HTTP错误: 404 Not Found");
    assert_eq!(hits.count.load(Ordering::SeqCst), 1);

    let report = executor
        .probe(&config(format!("http://{addr}/boom"), 5, 0))
        .await;
    assert_eq!(report.status_code, 500);
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let (addr, _hits) = serve().await;
    let executor = HttpProbeExecutor::new().unwrap();

    let report = executor
        .probe(&config(format!("http://{addr}/moved"), 5, 0))
        .await;

    assert!(report.is_success());
    assert_eq!(report.status_code, 200);
}

#[tokio::test]
async fn test_timeout_is_retried_then_fails_with_code_zero() {
    let (addr, hits) = serve().await;
    let executor = HttpProbeExecutor::new().unwrap();

    let report = executor
        .probe(&config(format!("http://{addr}/slow"), 1, 1))
        .await;

    assert_eq!(report.outcome, ProbeOutcome::Failure);
    assert_eq!(report.status_code, 0);
    assert_eq!(report.message, "失败 - 请求超时（重试1次后仍失败）");
    assert_eq!(hits.count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_refused_connection_fails_with_code_zero() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let executor = HttpProbeExecutor::new().unwrap();
    let report = executor
        .probe(&config(format!("http://{addr}/"), 2, 0))
        .await;

    assert_eq!(report.outcome, ProbeOutcome::Failure);
    assert_eq!(report.status_code, 0);
    assert_eq!(report.message, "失败 - 连接错误（重试0次后仍失败）");
}

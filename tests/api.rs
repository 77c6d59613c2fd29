//! Control API driven through the router

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDateTime;
use serde_json::Value;
use tower::ServiceExt;

use pomoduru::{
    api::create_router,
    services::{Clock, Notifier, Suspender},
    settings::Settings,
    state::AppState,
    timer::{Phase, Scheduler, Timer},
};

struct Quiet;

#[async_trait]
impl Notifier for Quiet {
    async fn notify(&self, _title: &str, _message: &str) -> Result<(), String> {
        Ok(())
    }
}

#[async_trait]
impl Suspender for Quiet {
    async fn suspend(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Clock for Quiet {
    fn now(&self) -> NaiveDateTime {
        NaiveDateTime::default()
    }
}

fn app() -> (Router, Arc<AppState>) {
    let timer = Timer::new(Settings::default(), Arc::new(Quiet), Arc::new(Quiet));
    let scheduler = Scheduler::new(timer.clone(), Arc::new(Quiet));
    let state = AppState::new(timer, scheduler, 20554, "127.0.0.1".to_string());
    (create_router(Arc::clone(&state)), state)
}

async fn call(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (router, _) = app();
    let (status, body) = call(&router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test(start_paused = true)]
async fn status_of_idle_timer() {
    let (router, _) = app();
    let (status, body) = call(&router, "GET", "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["state"], "idle");
    assert_eq!(body["timer"]["remaining_seconds"], 0);
    assert_eq!(body["timer"]["extend_used"], false);
    assert_eq!(body["always_on"], false);
    assert_eq!(body["schedule"]["enabled"], false);
    assert_eq!(body["schedule"]["start"], "09:00");
    assert_eq!(body["schedule"]["active"], false);
    assert!(body["last_change"].is_null());
}

#[tokio::test(start_paused = true)]
async fn start_then_stop() {
    let (router, state) = app();

    let (status, body) = call(&router, "POST", "/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["timer"]["state"], "working");
    assert_eq!(body["timer"]["remaining_seconds"], 3000);
    assert_eq!(state.timer.state(), Phase::Working);

    let (_, body) = call(&router, "GET", "/status").await;
    assert_eq!(body["last_change"], "working");

    let (status, body) = call(&router, "POST", "/stop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["state"], "idle");
    assert_eq!(state.timer.state(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn extend_outside_warning_conflicts() {
    let (router, state) = app();
    state.timer.start();

    let (status, body) = call(&router, "POST", "/extend").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["timer"]["state"], "working");
    assert_eq!(state.timer.state(), Phase::Working);
}

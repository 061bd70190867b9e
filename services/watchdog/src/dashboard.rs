//! Status page and JSON endpoints for the watchdog

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::watchdog::{Watchdog, WatchdogStatus};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub watchdog: Arc<Watchdog>,
}

/// Build the dashboard axum router
pub fn build_router(watchdog: Arc<Watchdog>) -> Router {
    let dashboard_state = DashboardState { watchdog };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/watchdog/start", post(start_handler))
        .route("/api/watchdog/stop", post(stop_handler))
        .route("/watchdog/start", post(start_form_handler))
        .route("/watchdog/stop", post(stop_form_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let snapshot = dashboard.watchdog.snapshot().await;

    let (headline, detail) = match snapshot.status {
        WatchdogStatus::Idle => ("Connection lost", "Waiting to retry.".to_string()),
        WatchdogStatus::Retrying => (
            "Connection lost",
            format!("Retry attempt {}", snapshot.attempt_count),
        ),
        WatchdogStatus::Stopped => (
            "Connection lost",
            format!("Retrying paused after {} attempts.", snapshot.attempt_count),
        ),
        WatchdogStatus::Succeeded => (
            "Back online",
            format!("Returning to {}", snapshot.target_route),
        ),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Connectivity Watchdog</title><meta http-equiv="refresh" content="2"></head>
<body style="font-family: sans-serif; margin: 2rem;">
    <h1>{}</h1>
    <p>{}</p>
    <form method="post" action="/watchdog/start" style="display: inline;"><button>Retry</button></form>
    <form method="post" action="/watchdog/stop" style="display: inline;"><button>Stop</button></form>
</body>
</html>"#,
        headline, detail
    );

    Html(html)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.watchdog.snapshot().await)
}

async fn start_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    dashboard.watchdog.start().await;
    Json(dashboard.watchdog.snapshot().await)
}

async fn stop_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    dashboard.watchdog.stop().await;
    Json(dashboard.watchdog.snapshot().await)
}

// Form posts from the status page land back on it.
async fn start_form_handler(State(dashboard): State<DashboardState>) -> Redirect {
    dashboard.watchdog.start().await;
    Redirect::to("/")
}

async fn stop_form_handler(State(dashboard): State<DashboardState>) -> Redirect {
    dashboard.watchdog.stop().await;
    Redirect::to("/")
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

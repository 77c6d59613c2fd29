//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{info, warn};

use super::responses::{
    ApiResponse, HealthResponse, ScheduleStatus, StatusResponse, TimerStatus,
};
use crate::state::AppState;

/// Handle POST /start - Begin (or restart) a work session
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.timer.start();
    info!("Start endpoint called - work session started");
    Json(ApiResponse::ok(
        "Work session started".to_string(),
        TimerStatus::capture(&state),
    ))
}

/// Handle POST /stop - Return the timer to idle
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.timer.stop();
    info!("Stop endpoint called - timer stopped");
    Json(ApiResponse::ok(
        "Timer stopped".to_string(),
        TimerStatus::capture(&state),
    ))
}

/// Handle POST /extend - Take the one extension of this cycle
pub async fn extend_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    if state.timer.extend() {
        let extend = state.timer.settings().extend_duration;
        info!("Extend endpoint called - work extended by {:?}", extend);
        return Ok(Json(ApiResponse::ok(
            format!("Work extended by {} minutes", extend.as_secs() / 60),
            TimerStatus::capture(&state),
        )));
    }

    let timer = TimerStatus::capture(&state);
    let message = if timer.extend_used {
        "Extension already used this cycle".to_string()
    } else {
        format!("Extension only available during warning (timer is {})", timer.state)
    };
    warn!("Extend refused: {}", message);
    Err((StatusCode::CONFLICT, Json(ApiResponse::error(message, timer))))
}

/// Handle GET /status - Return current timer, schedule and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let settings = state.timer.settings();
    let last_change = state.get_last_change();

    Json(StatusResponse {
        timer: TimerStatus::capture(&state),
        always_on: settings.always_on,
        schedule: ScheduleStatus {
            enabled: settings.schedule_enabled,
            start: settings.schedule_start.clone(),
            end: settings.schedule_end.clone(),
            active: state.scheduler.is_active(),
        },
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_change: last_change.map(|(change, _)| change.phase),
        last_change_time: last_change.map(|(_, at)| at),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

//! 모니터링 제어 REST 핸들러.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use camwatch_core::models::command::{ControlCommand, StartRequest};

use super::{apply_command, current_state, ControlResponse};
use crate::error::ApiError;
use crate::AppState;

/// POST /api/monitoring/start
///
/// 본문 `{"mode": "basic" | "advanced"}` (생략 시 basic).
/// 이미 실행 중이면 `accepted: false`로 응답한다 (에러 아님).
pub async fn start_monitoring(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ControlResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice::<StartRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("잘못된 시작 요청: {e}")))?
    };

    Ok(Json(apply_command(
        &state.controller,
        ControlCommand::StartMonitoring(request),
    )))
}

/// POST /api/monitoring/stop
pub async fn stop_monitoring(State(state): State<AppState>) -> Json<ControlResponse> {
    Json(apply_command(&state.controller, ControlCommand::StopMonitoring))
}

/// GET /api/monitoring/state
pub async fn get_state(State(state): State<AppState>) -> Json<ControlResponse> {
    Json(current_state(&state.controller))
}

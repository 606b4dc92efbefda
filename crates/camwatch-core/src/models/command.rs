//! 제어 채널 명령.
//!
//! 대시보드에서 들어오는 `start_monitoring` / `stop_monitoring` 메시지.
//! 와이어 포맷: `{"event": "<name>", "data": {...}}` (data 생략 가능)

use serde::Deserialize;

use crate::error::CoreError;
use crate::models::session::MonitorMode;

/// 모니터링 시작 요청 본문
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartRequest {
    /// 모니터링 모드 (기본: basic)
    #[serde(default)]
    pub mode: MonitorMode,
}

/// 제어 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    StartMonitoring(StartRequest),
    StopMonitoring,
}

#[derive(Deserialize)]
struct RawCommand {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ControlCommand {
    /// JSON 텍스트 메시지 파싱
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let raw: RawCommand = serde_json::from_str(text)?;
        match raw.event.as_str() {
            "start_monitoring" => {
                let request = if raw.data.is_null() {
                    StartRequest::default()
                } else {
                    serde_json::from_value(raw.data)?
                };
                Ok(ControlCommand::StartMonitoring(request))
            }
            "stop_monitoring" => Ok(ControlCommand::StopMonitoring),
            other => Err(CoreError::Validation {
                field: "event".to_string(),
                message: format!("알 수 없는 명령: {other}"),
            }),
        }
    }
}

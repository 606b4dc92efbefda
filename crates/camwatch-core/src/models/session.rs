//! 모니터링 세션 모델.
//!
//! 세션 식별자, 모드, 엔드포인트, 라이프사이클 상태를 표현.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 모니터링 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// 처리량/FPS 지표만 수집
    #[default]
    Basic,
    /// 프레임별 이미지 품질 분석 포함
    Advanced,
}

impl MonitorMode {
    /// 와이어 포맷 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorMode::Basic => "basic",
            MonitorMode::Advanced => "advanced",
        }
    }

    /// 품질 분석 수행 여부
    pub fn analyzes_quality(&self) -> bool {
        matches!(self, MonitorMode::Advanced)
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(MonitorMode::Basic),
            "advanced" => Ok(MonitorMode::Advanced),
            other => Err(CoreError::Validation {
                field: "mode".to_string(),
                message: format!("알 수 없는 모니터링 모드: {other}"),
            }),
        }
    }
}

/// 세션 라이프사이클 상태
///
/// `Idle → Connecting → Active → {Stopped, Failed}`.
/// 종료 상태(Stopped, Failed)에서는 새 `start()`로만 Connecting에 재진입한다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// 세션 없음
    #[default]
    Idle,
    /// 스트림 연결 중
    Connecting,
    /// 모니터링 루프 실행 중
    Active,
    /// 정상 중지됨
    Stopped,
    /// 에러로 종료됨
    Failed,
}

impl SessionState {
    /// 워커가 살아있는 상태인지 (Connecting/Active)
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }

    /// 종료 상태인지 (Stopped/Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "Idle",
            SessionState::Connecting => "Connecting",
            SessionState::Active => "Active",
            SessionState::Stopped => "Stopped",
            SessionState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 모니터링 세션 정보 (스냅샷)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// 세션 고유 ID
    pub session_id: String,
    /// 카메라 식별자
    pub camera_id: String,
    /// 모니터링 모드
    pub mode: MonitorMode,
    /// 스트림 엔드포인트 (자격증명 마스킹됨)
    pub endpoint: String,
    /// 현재 상태
    pub state: SessionState,
    /// 시작 요청 시각
    pub started_at: DateTime<Utc>,
    /// Active 전환 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    /// 종료 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    /// Connecting 상태의 새 세션 생성
    pub fn connecting(camera_id: &str, mode: MonitorMode, endpoint: &str) -> Self {
        Self {
            session_id: generate_session_id(),
            camera_id: camera_id.to_string(),
            mode,
            endpoint: redact_credentials(endpoint),
            state: SessionState::Connecting,
            started_at: Utc::now(),
            activated_at: None,
            ended_at: None,
        }
    }
}

/// 세션 ID 생성 -- 타임스탬프 + UUID 접미사
pub fn generate_session_id() -> String {
    let ts = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("mon_{ts}_{}", &suffix[..8])
}

/// 엔드포인트의 사용자 정보(`user:pass@`)를 `***@`로 마스킹
///
/// 로그/이벤트에 자격증명이 노출되지 않도록 한다.
pub fn redact_credentials(endpoint: &str) -> String {
    let Some(scheme_end) = endpoint.find("://") else {
        return endpoint.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &endpoint[authority_start..];
    let authority_len = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_len].rfind('@') {
        Some(at) => format!(
            "{}***{}",
            &endpoint[..authority_start],
            &rest[at..]
        ),
        None => endpoint.to_string(),
    }
}

//! 대시보드 이벤트 모델.
//!
//! 세션 워커가 발행하는 상태 스냅샷(`status_update`)과
//! 로그 라인(`log_entry`)의 와이어 포맷을 정의한다.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// 로그 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 대시보드 로그 라인
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// 메시지 본문
    pub message: String,
    /// 심각도
    #[serde(rename = "type")]
    pub level: LogLevel,
    /// 벽시계 시각 (HH:MM:SS)
    pub time: String,
    /// 기록 시각 (영구 로그 싱크용, 와이어에는 미포함)
    #[serde(skip)]
    pub logged_at: DateTime<Local>,
}

impl LogEvent {
    /// 현재 시각으로 로그 이벤트 생성
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            message: message.into(),
            level,
            time: now.format("%H:%M:%S").to_string(),
            logged_at: now,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// 영구 로그 파일용 한 줄 표현
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}] {}",
            self.logged_at.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// 대시보드 연결 상태 라벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLabel {
    /// 모니터링 중
    Active,
    /// 세션 종료 (중지/실패)
    Inactive,
    /// 스트림 연결 실패
    ConnectionError,
    /// 카메라 호스트 도달 불가
    CameraUnreachable,
}

impl ConnectionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionLabel::Active => "Активно",
            ConnectionLabel::Inactive => "Не активно",
            ConnectionLabel::ConnectionError => "Ошибка подключения",
            ConnectionLabel::CameraUnreachable => "Камера недоступна",
        }
    }
}

impl fmt::Display for ConnectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active 상태에서만 포함되는 스트림 지표
///
/// 처리량은 kbit 단위, 소수점 1자리 문자열로 전송한다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetrics {
    pub bitrate: String,
    pub fps: String,
    pub quality: String,
    pub frame_count: u64,
    pub avg_bitrate: String,
    pub uptime: u64,
}

impl StreamMetrics {
    /// 원시 측정값(비트/프레임, fps)에서 와이어 포맷 생성
    pub fn new(
        bitrate_bits: f64,
        avg_bitrate_bits: f64,
        fps: f64,
        quality: &str,
        frame_count: u64,
        uptime_secs: u64,
    ) -> Self {
        Self {
            bitrate: format!("{:.1}", bitrate_bits / 1000.0),
            fps: format!("{:.1}", fps),
            quality: quality.to_string(),
            frame_count,
            avg_bitrate: format!("{:.1}", avg_bitrate_bits / 1000.0),
            uptime: uptime_secs,
        }
    }
}

/// 대시보드 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// 연결 상태 라벨
    pub connection_status: String,
    /// 지속 문제 알림 여부
    pub alert: bool,
    /// 스트림 지표 (Active 상태에서만)
    #[serde(flatten)]
    pub metrics: Option<StreamMetrics>,
}

impl StatusEvent {
    /// Active 상태의 전체 스냅샷
    pub fn active(metrics: StreamMetrics, alert: bool) -> Self {
        Self {
            connection_status: ConnectionLabel::Active.as_str().to_string(),
            alert,
            metrics: Some(metrics),
        }
    }

    /// 지표 없는 축약 상태
    pub fn reduced(label: ConnectionLabel, alert: bool) -> Self {
        Self {
            connection_status: label.as_str().to_string(),
            alert,
            metrics: None,
        }
    }

    /// 세션 종료 후 1회 발행되는 비활성 상태 (알림 해제)
    pub fn inactive() -> Self {
        Self::reduced(ConnectionLabel::Inactive, false)
    }
}

/// 구독자에게 전달되는 이벤트
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    LogEntry(LogEvent),
    StatusUpdate(StatusEvent),
}

impl DashboardEvent {
    /// 이벤트 이름 (SSE event 필드 등)
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::LogEntry(_) => "log_entry",
            DashboardEvent::StatusUpdate(_) => "status_update",
        }
    }

    /// 본문만 JSON으로 직렬화
    pub fn data_json(&self) -> Result<String, serde_json::Error> {
        match self {
            DashboardEvent::LogEntry(log) => serde_json::to_string(log),
            DashboardEvent::StatusUpdate(status) => serde_json::to_string(status),
        }
    }
}

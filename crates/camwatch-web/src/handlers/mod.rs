//! 대시보드 핸들러 모듈.
//!
//! WebSocket, SSE, REST 세 전송 경로가 같은 제어 명령 처리와
//! 접속 인사 메시지를 공유한다.

pub mod control;
pub mod stream;
pub mod ws;

use serde::Serialize;

use camwatch_core::models::command::ControlCommand;
use camwatch_core::models::event::LogEvent;
use camwatch_core::models::session::{SessionInfo, SessionState};
use camwatch_monitor::{SessionController, StartOutcome, StopOutcome};

/// 새 구독자에게만 보내는 접속 인사
pub fn greeting() -> LogEvent {
    LogEvent::success("Подключение к серверу установлено")
}

/// 제어 명령 처리 결과
#[derive(Debug, Clone, Serialize)]
pub struct ControlResponse {
    /// 명령 수락 여부 (거부는 에러가 아님)
    pub accepted: bool,
    /// 처리 후 세션 상태
    pub state: SessionState,
    /// 현재(또는 마지막) 세션
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
}

impl ControlResponse {
    fn from_controller(controller: &SessionController, accepted: bool) -> Self {
        Self {
            accepted,
            state: controller.state(),
            session: controller.snapshot(),
        }
    }
}

/// 제어 명령 적용 — 결과 로그는 컨트롤러가 허브로 발행한다
pub fn apply_command(controller: &SessionController, command: ControlCommand) -> ControlResponse {
    let accepted = match command {
        ControlCommand::StartMonitoring(request) => {
            matches!(controller.start(request.mode), StartOutcome::Started(_))
        }
        ControlCommand::StopMonitoring => {
            matches!(controller.stop(), StopOutcome::Requested(_))
        }
    };
    ControlResponse::from_controller(controller, accepted)
}

/// 현재 상태 조회
pub fn current_state(controller: &SessionController) -> ControlResponse {
    ControlResponse::from_controller(controller, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 핸들러 테스트용 인메모리 포트

    use std::sync::Arc;

    use async_trait::async_trait;
    use camwatch_core::config::{CameraConfig, SessionConfig};
    use camwatch_core::error::CoreError;
    use camwatch_core::models::frame::VideoFrame;
    use camwatch_core::models::quality::QualityMetrics;
    use camwatch_core::ports::probe::{ProbeOutcome, ReachabilityProbe};
    use camwatch_core::ports::stream::{FrameRead, StreamConnector, StreamSource};
    use camwatch_core::ports::vision::QualityAnalyzer;
    use camwatch_monitor::{SessionController, SessionDeps};

    use crate::hub::EventHub;
    use crate::AppState;

    struct Frames;

    #[async_trait]
    impl StreamSource for Frames {
        async fn open(&mut self, _endpoint: &str) -> Result<(), CoreError> {
            Ok(())
        }
        async fn read_frame(&mut self) -> Result<FrameRead, CoreError> {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            Ok(FrameRead::Frame(VideoFrame::new(vec![0u8; 512])))
        }
        fn close(&mut self) {}
    }

    struct FramesConnector;

    impl StreamConnector for FramesConnector {
        fn create(&self) -> Box<dyn StreamSource> {
            Box::new(Frames)
        }
    }

    struct Reachable;

    #[async_trait]
    impl ReachabilityProbe for Reachable {
        fn extract_host(&self, _endpoint: &str) -> Option<String> {
            Some("cam".to_string())
        }
        async fn probe(&self, _host: &str) -> ProbeOutcome {
            ProbeOutcome::Reachable
        }
    }

    struct Neutral;

    impl QualityAnalyzer for Neutral {
        fn analyze(&self, _frame: &VideoFrame) -> Result<QualityMetrics, CoreError> {
            Ok(QualityMetrics::from_measurements(128.0, 400.0, 50.0))
        }
    }

    pub fn state() -> AppState {
        let hub = EventHub::default();
        let deps = SessionDeps {
            connector: Arc::new(FramesConnector),
            probe: Arc::new(Reachable),
            analyzer: Arc::new(Neutral),
            publisher: Arc::new(hub.clone()),
        };
        let timing = SessionConfig {
            poll_interval_ms: 1,
            evaluation_interval_ms: 20,
            transient_backoff_ms: 10,
        };
        let controller = SessionController::new(CameraConfig::default(), timing, deps);
        AppState { controller, hub }
    }
}

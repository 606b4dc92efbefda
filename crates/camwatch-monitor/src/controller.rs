//! 세션 컨트롤러.
//!
//! 시스템 전체에서 단 하나의 모니터링 세션을 소유한다.
//! 상태 확인과 전이는 하나의 잠금 구간에서 수행되므로, 동시에 들어온
//! 두 시작 요청이 모두 통과해 워커를 두 개 띄우는 일이 없다.
//!
//! 상태 전이: Idle → Connecting → Active → {Stopped, Failed}.
//! 종료 상태에서는 새 `start()`로만 다시 Connecting에 진입한다.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use camwatch_core::config::{CameraConfig, SessionConfig};
use camwatch_core::models::event::{LogEvent, StatusEvent};
use camwatch_core::models::session::{MonitorMode, SessionInfo, SessionState};

use crate::session::{SessionDeps, SessionOutcome, SessionWorker};

/// 시작 요청 결과
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// 새 세션 생성 (Connecting)
    Started(SessionInfo),
    /// 이미 실행 중 — 상태 변화 없음
    Rejected(SessionState),
}

/// 정지 요청 결과
#[derive(Debug, Clone)]
pub enum StopOutcome {
    /// 활성 세션에 정지 신호 전달
    Requested(SessionInfo),
    /// 활성 세션 없음 — 상태 변화 없음
    NotActive(SessionState),
}

#[derive(Default)]
struct Slot {
    info: Option<SessionInfo>,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Slot {
    fn state(&self) -> SessionState {
        self.info.as_ref().map(|i| i.state).unwrap_or_default()
    }
}

struct Inner {
    camera: CameraConfig,
    timing: SessionConfig,
    deps: SessionDeps,
    slot: Mutex<Slot>,
    state_tx: watch::Sender<SessionState>,
}

impl Inner {
    /// 세션 ID가 현재 세션과 일치할 때만 상태 전이
    fn transition(&self, session_id: &str, state: SessionState) {
        let mut guard = self.slot.lock();
        let slot = &mut *guard;
        let Some(info) = slot.info.as_mut() else {
            return;
        };
        if info.session_id != session_id {
            debug!("이전 세션의 상태 전이 무시: {} → {}", session_id, state);
            return;
        }

        let previous = info.state;
        info.state = state;
        match state {
            SessionState::Active => info.activated_at = Some(Utc::now()),
            SessionState::Stopped | SessionState::Failed => {
                info.ended_at = Some(Utc::now());
                slot.stop_tx = None;
            }
            _ => {}
        }
        self.state_tx.send_replace(state);
        info!("세션 상태 전이: {} → {} ({})", previous, state, session_id);
    }
}

/// 단일 세션 컨트롤러
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(camera: CameraConfig, timing: SessionConfig, deps: SessionDeps) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner {
                camera,
                timing,
                deps,
                slot: Mutex::new(Slot::default()),
                state_tx,
            }),
        }
    }

    /// 모니터링 시작
    ///
    /// Idle 또는 종료 상태에서만 허용. Connecting/Active이면 로그만 남기고 거부한다.
    /// tokio 런타임 컨텍스트에서 호출해야 한다.
    pub fn start(&self, mode: MonitorMode) -> StartOutcome {
        let mut slot = self.inner.slot.lock();
        let state = slot.state();
        if state.is_running() {
            drop(slot);
            info!("시작 요청 거부 - 현재 상태 {}", state);
            self.inner
                .deps
                .publisher
                .publish_log(LogEvent::info("Мониторинг уже запущен"));
            return StartOutcome::Rejected(state);
        }

        let info = SessionInfo::connecting(
            &self.inner.camera.camera_id,
            mode,
            &self.inner.camera.endpoint,
        );
        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = SessionWorker::new(
            info.session_id.clone(),
            self.inner.camera.endpoint.clone(),
            mode,
            self.inner.timing.clone(),
            self.inner.deps.clone(),
            stop_rx,
        );

        slot.info = Some(info.clone());
        slot.stop_tx = Some(stop_tx);
        self.inner.state_tx.send_replace(SessionState::Connecting);
        slot.task = Some(tokio::spawn(supervise(
            Arc::clone(&self.inner),
            info.session_id.clone(),
            worker,
        )));
        drop(slot);

        info!(
            "세션 시작: {} (mode={}, camera={}, endpoint={})",
            info.session_id, mode, info.camera_id, info.endpoint
        );
        self.inner
            .deps
            .publisher
            .publish_log(LogEvent::success(format!("Запущен {mode} мониторинг")));
        StartOutcome::Started(info)
    }

    /// 모니터링 정지 요청 (협조적)
    ///
    /// Active가 아니면 정보 로그만 남기는 no-op.
    pub fn stop(&self) -> StopOutcome {
        let slot = self.inner.slot.lock();
        let state = slot.state();
        if state != SessionState::Active {
            drop(slot);
            info!("정지 요청 무시 - 현재 상태 {}", state);
            let message = if state == SessionState::Connecting {
                "Подключение к потоку еще не завершено"
            } else {
                "Мониторинг не запущен"
            };
            self.inner.deps.publisher.publish_log(LogEvent::info(message));
            return StopOutcome::NotActive(state);
        }

        let already = slot
            .stop_tx
            .as_ref()
            .map(|tx| tx.send_replace(true))
            .unwrap_or(true);
        let info = slot.info.clone();
        drop(slot);

        let Some(info) = info else {
            return StopOutcome::NotActive(state);
        };
        if !already {
            info!("세션 정지 요청: {}", info.session_id);
            self.inner
                .deps
                .publisher
                .publish_log(LogEvent::warning("Остановка мониторинга..."));
        }
        StopOutcome::Requested(info)
    }

    /// 현재 세션 상태
    pub fn state(&self) -> SessionState {
        self.inner.slot.lock().state()
    }

    /// 현재(또는 마지막) 세션 스냅샷
    pub fn snapshot(&self) -> Option<SessionInfo> {
        self.inner.slot.lock().info.clone()
    }

    /// 상태 변경 구독
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// 종료 처리 — 상태와 무관하게 정지 신호를 보내고 워커 종료까지 대기
    pub async fn shutdown(&self) {
        let task = {
            let mut slot = self.inner.slot.lock();
            if let Some(tx) = slot.stop_tx.as_ref() {
                tx.send_replace(true);
            }
            slot.task.take()
        };

        if let Some(task) = task {
            info!("활성 세션 종료 대기");
            if let Err(e) = task.await {
                warn!("세션 태스크 종료 에러: {}", e);
            }
        }
    }
}

/// 워커 실행 및 최종 상태 반영
///
/// 워커 패닉도 여기서 잡아 Failed로 처리한다.
async fn supervise(inner: Arc<Inner>, session_id: String, worker: SessionWorker) {
    let on_active = {
        let inner = Arc::clone(&inner);
        let session_id = session_id.clone();
        move || inner.transition(&session_id, SessionState::Active)
    };

    let final_state = match tokio::spawn(worker.run(on_active)).await {
        Ok(SessionOutcome::Stopped) => SessionState::Stopped,
        Ok(outcome) => {
            warn!("세션 실패 종료 ({}): {:?}", session_id, outcome);
            SessionState::Failed
        }
        Err(e) => {
            error!("세션 워커 비정상 종료 ({}): {}", session_id, e);
            let publisher = &inner.deps.publisher;
            publisher.publish_log(LogEvent::error("ERROR: Внутренняя ошибка мониторинга"));
            publisher.publish_status(StatusEvent::inactive());
            SessionState::Failed
        }
    };

    inner.transition(&session_id, final_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use camwatch_core::error::CoreError;
    use camwatch_core::models::frame::VideoFrame;
    use camwatch_core::models::quality::QualityMetrics;
    use camwatch_core::ports::events::EventPublisher;
    use camwatch_core::ports::probe::{ProbeOutcome, ReachabilityProbe};
    use camwatch_core::ports::stream::{FrameRead, StreamConnector, StreamSource};
    use camwatch_core::ports::vision::QualityAnalyzer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        logs: Mutex<Vec<LogEvent>>,
    }

    impl EventPublisher for Recorder {
        fn publish_status(&self, _status: StatusEvent) {}
        fn publish_log(&self, log: LogEvent) {
            self.logs.lock().push(log);
        }
    }

    struct Frames;

    #[async_trait]
    impl StreamSource for Frames {
        async fn open(&mut self, _endpoint: &str) -> Result<(), CoreError> {
            Ok(())
        }
        async fn read_frame(&mut self) -> Result<FrameRead, CoreError> {
            Ok(FrameRead::Frame(VideoFrame::new(vec![1u8; 64])))
        }
        fn close(&mut self) {}
    }

    #[derive(Default)]
    struct Counting {
        created: AtomicUsize,
    }

    impl StreamConnector for Counting {
        fn create(&self) -> Box<dyn StreamSource> {
            self.created.fetch_add(1, Ordering::SeqCst);
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

    struct Good;

    impl QualityAnalyzer for Good {
        fn analyze(&self, _frame: &VideoFrame) -> Result<QualityMetrics, CoreError> {
            Ok(QualityMetrics::from_measurements(120.0, 500.0, 60.0))
        }
    }

    fn controller() -> (SessionController, Arc<Counting>, Arc<Recorder>) {
        let connector = Arc::new(Counting::default());
        let recorder = Arc::new(Recorder::default());
        let deps = SessionDeps {
            connector: connector.clone(),
            probe: Arc::new(Reachable),
            analyzer: Arc::new(Good),
            publisher: recorder.clone(),
        };
        let timing = SessionConfig {
            poll_interval_ms: 1,
            evaluation_interval_ms: 50,
            transient_backoff_ms: 10,
        };
        let camera = CameraConfig {
            camera_id: "cam_test".to_string(),
            endpoint: "rtsp://user:pw@cam/live".to_string(),
        };
        (
            SessionController::new(camera, timing, deps),
            connector,
            recorder,
        )
    }

    async fn wait_for(controller: &SessionController, target: SessionState) {
        let mut rx = controller.subscribe_state();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == target))
            .await
            .expect("state timeout")
            .expect("state channel closed");
    }

    #[tokio::test]
    async fn starts_then_stops() {
        let (controller, connector, recorder) = controller();
        assert_eq!(controller.state(), SessionState::Idle);

        let info = match controller.start(MonitorMode::Basic) {
            StartOutcome::Started(info) => info,
            other => panic!("unexpected: {other:?}"),
        };
        assert_eq!(info.camera_id, "cam_test");
        assert_eq!(info.endpoint, "rtsp://***@cam/live");

        wait_for(&controller, SessionState::Active).await;
        assert!(controller.snapshot().unwrap().activated_at.is_some());

        assert!(matches!(controller.stop(), StopOutcome::Requested(_)));
        wait_for(&controller, SessionState::Stopped).await;
        controller.shutdown().await;

        assert_eq!(connector.created.load(Ordering::SeqCst), 1);
        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.state, SessionState::Stopped);
        assert!(snapshot.ended_at.is_some());
        let messages: Vec<String> = recorder.logs.lock().iter().map(|l| l.message.clone()).collect();
        assert!(messages.contains(&"Запущен basic мониторинг".to_string()));
        assert!(messages.contains(&"Остановка мониторинга...".to_string()));
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (controller, connector, recorder) = controller();
        assert!(matches!(
            controller.start(MonitorMode::Advanced),
            StartOutcome::Started(_)
        ));
        assert!(matches!(
            controller.start(MonitorMode::Basic),
            StartOutcome::Rejected(_)
        ));
        controller.shutdown().await;

        assert_eq!(connector.created.load(Ordering::SeqCst), 1);
        assert!(recorder
            .logs
            .lock()
            .iter()
            .any(|l| l.message == "Мониторинг уже запущен"));
    }

    #[tokio::test]
    async fn stop_while_idle_is_noop() {
        let (controller, _, _) = controller();
        assert!(matches!(
            controller.stop(),
            StopOutcome::NotActive(SessionState::Idle)
        ));
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.snapshot().is_none());
    }

    #[tokio::test]
    async fn restart_after_stop_creates_new_session() {
        let (controller, connector, _) = controller();
        let first = match controller.start(MonitorMode::Basic) {
            StartOutcome::Started(info) => info.session_id,
            other => panic!("unexpected: {other:?}"),
        };
        wait_for(&controller, SessionState::Active).await;
        controller.stop();
        wait_for(&controller, SessionState::Stopped).await;

        let second = match controller.start(MonitorMode::Basic) {
            StartOutcome::Started(info) => info.session_id,
            other => panic!("unexpected: {other:?}"),
        };
        assert_ne!(first, second);
        controller.shutdown().await;
        assert_eq!(connector.created.load(Ordering::SeqCst), 2);
    }
}

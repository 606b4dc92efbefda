//! 모니터링 세션 워커.
//!
//! 세션당 하나의 백그라운드 태스크에서 실행된다.
//! 스트림 연결 → 프레임 수집 루프 → 종료 처리 순서로 진행하며,
//! 스트림 핸들은 `StreamGuard`로 감싸 모든 종료 경로에서 정확히 한 번 해제한다.
//!
//! 정지는 협조적이다. 프레임 읽기와 모든 대기는 정지 신호와 경합하므로
//! 정지 지연 상한은 취소 불가능한 도달성 검사 타임아웃이다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use camwatch_core::config::SessionConfig;
use camwatch_core::error::CoreError;
use camwatch_core::models::event::{ConnectionLabel, LogEvent, StatusEvent, StreamMetrics};
use camwatch_core::models::frame::VideoFrame;
use camwatch_core::models::quality::QualityLabel;
use camwatch_core::models::session::{redact_credentials, MonitorMode};
use camwatch_core::ports::events::EventPublisher;
use camwatch_core::ports::probe::{ProbeOutcome, ReachabilityProbe};
use camwatch_core::ports::stream::{FrameRead, StreamConnector, StreamSource};
use camwatch_core::ports::vision::QualityAnalyzer;

use crate::anomaly::{self, AlertState, AlertTransition};
use crate::metrics_window::{FrameClock, MetricsWindow};

/// 상태 이벤트의 평균 처리량 구간
const STATUS_AVERAGE_SAMPLES: usize = 10;

/// 세션 워커 의존성 (포트)
#[derive(Clone)]
pub struct SessionDeps {
    pub connector: Arc<dyn StreamConnector>,
    pub probe: Arc<dyn ReachabilityProbe>,
    pub analyzer: Arc<dyn QualityAnalyzer>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// 워커 종료 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 정지 요청으로 정상 종료
    Stopped,
    /// 스트림 연결 실패
    OpenFailed(String),
    /// 스트림 소진
    EndOfStream,
    /// 복구 불가능한 루프 에러
    Fatal(String),
}

/// 수집 루프 종료 사유
enum LoopExit {
    Stopped,
    EndOfStream,
    Fatal(CoreError),
}

/// 스트림 핸들 스코프 가드 — `close()`는 정확히 한 번
struct StreamGuard {
    source: Box<dyn StreamSource>,
    released: bool,
}

impl StreamGuard {
    fn new(source: Box<dyn StreamSource>) -> Self {
        Self {
            source,
            released: false,
        }
    }

    fn source(&mut self) -> &mut dyn StreamSource {
        self.source.as_mut()
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.close();
            debug!("스트림 핸들 해제");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// 정지 신호 대기 (송신측 소멸도 정지로 간주)
async fn stop_signalled(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// 단일 세션 워커
pub struct SessionWorker {
    session_id: String,
    endpoint: String,
    mode: MonitorMode,
    timing: SessionConfig,
    deps: SessionDeps,
    stop: watch::Receiver<bool>,
}

impl SessionWorker {
    pub fn new(
        session_id: impl Into<String>,
        endpoint: impl Into<String>,
        mode: MonitorMode,
        timing: SessionConfig,
        deps: SessionDeps,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            endpoint: endpoint.into(),
            mode,
            timing,
            deps,
            stop,
        }
    }

    /// 세션 실행 — 연결 성공 시 `on_active` 호출
    pub async fn run<F>(mut self, on_active: F) -> SessionOutcome
    where
        F: FnOnce() + Send,
    {
        info!(
            session_id = %self.session_id,
            mode = %self.mode,
            endpoint = %redact_credentials(&self.endpoint),
            "모니터링 세션 시작"
        );
        self.log(LogEvent::info(format!(
            "Запуск мониторинга ({} режим)...",
            self.mode
        )));

        let mut guard = StreamGuard::new(self.deps.connector.create());

        if let Err(e) = guard.source().open(&self.endpoint).await {
            error!(session_id = %self.session_id, "스트림 연결 실패: {}", e);
            guard.release();
            self.log(LogEvent::error(
                "ERROR: Не удалось подключиться к RTSP потоку",
            ));
            self.status(StatusEvent::reduced(ConnectionLabel::ConnectionError, true));
            return SessionOutcome::OpenFailed(e.to_string());
        }

        self.log(LogEvent::success("Успешное подключение к RTSP потоку"));
        on_active();

        let exit = self.collect(&mut guard).await;
        guard.release();

        match exit {
            LoopExit::Stopped => {
                info!(session_id = %self.session_id, "모니터링 세션 정지");
                self.log(LogEvent::warning("Мониторинг остановлен"));
                self.status(StatusEvent::inactive());
                SessionOutcome::Stopped
            }
            LoopExit::EndOfStream => {
                warn!(session_id = %self.session_id, "스트림 소진 - 세션 종료");
                self.log(LogEvent::error("ERROR: Видеопоток завершен"));
                self.status(StatusEvent::inactive());
                SessionOutcome::EndOfStream
            }
            LoopExit::Fatal(e) => {
                error!(session_id = %self.session_id, "수집 루프 에러: {}", e);
                self.log(LogEvent::error(format!("ERROR: {e}")));
                self.status(StatusEvent::inactive());
                SessionOutcome::Fatal(e.to_string())
            }
        }
    }

    /// 프레임 수집 루프
    async fn collect(&mut self, guard: &mut StreamGuard) -> LoopExit {
        let mut window = MetricsWindow::new();
        let mut alert = AlertState::new();
        let mut frame_count: u64 = 0;
        let mut clock = FrameClock::new();
        let mut fps = 0.0;
        let activated_at = Instant::now();
        let mut last_evaluation = activated_at;
        let mut quality = QualityLabel::Good;

        loop {
            if *self.stop.borrow() {
                return LoopExit::Stopped;
            }

            let read = tokio::select! {
                read = guard.source().read_frame() => read,
                _ = stop_signalled(&mut self.stop) => return LoopExit::Stopped,
            };

            let frame = match read {
                Ok(FrameRead::Frame(frame)) => frame,
                Ok(FrameRead::Transient(reason)) => {
                    self.on_stream_lost(&reason).await;
                    if self.pause(self.timing.transient_backoff()).await {
                        return LoopExit::Stopped;
                    }
                    continue;
                }
                Ok(FrameRead::EndOfStream) => return LoopExit::EndOfStream,
                Err(e) => return LoopExit::Fatal(e),
            };

            let bits = frame.size_bits();
            window.record_throughput(bits);
            if let Some(rate) = clock.tick(frame.received_at) {
                window.record_frame_rate(rate);
                fps = rate;
            }
            frame_count += 1;

            if self.mode.analyzes_quality() {
                quality = self.assess(frame).await;
            }

            if last_evaluation.elapsed() >= self.timing.evaluation_interval() {
                let problem =
                    anomaly::throughput_drop(&window, bits) || anomaly::frame_rate_drop(&window, fps);
                let transition = alert.tick(problem);
                debug!(
                    "평가: 처리량={:.0}bit, fps={:.1}, 문제={}, 카운터={}",
                    bits,
                    fps,
                    problem,
                    alert.count()
                );
                if transition == AlertTransition::Raised {
                    self.on_alert_raised().await;
                }

                let average = if window.throughput_len() >= STATUS_AVERAGE_SAMPLES {
                    window.average_throughput(STATUS_AVERAGE_SAMPLES)
                } else {
                    bits
                };
                let metrics = StreamMetrics::new(
                    bits,
                    average,
                    fps,
                    quality.as_str(),
                    frame_count,
                    activated_at.elapsed().as_secs(),
                );
                self.status(StatusEvent::active(metrics, alert.is_active()));
                last_evaluation = Instant::now();
            }

            if self.pause(self.timing.poll_interval()).await {
                return LoopExit::Stopped;
            }
        }
    }

    /// 프레임 품질 라벨 — 분석 실패는 세션에 영향 없음
    ///
    /// 디코딩과 픽셀 연산은 블로킹 풀에서 실행한다.
    async fn assess(&self, frame: VideoFrame) -> QualityLabel {
        let analyzer = Arc::clone(&self.deps.analyzer);
        match tokio::task::spawn_blocking(move || analyzer.analyze(&frame)).await {
            Ok(Ok(metrics)) => metrics.label(),
            Ok(Err(e)) => {
                debug!("품질 분석 실패 (양호로 간주): {}", e);
                QualityLabel::Good
            }
            Err(e) => {
                warn!("품질 분석 태스크 실패 (양호로 간주): {}", e);
                QualityLabel::Good
            }
        }
    }

    /// 일시적 스트림 실패 처리 — 경고 후 도달성 검사
    async fn on_stream_lost(&self, reason: &str) {
        warn!(session_id = %self.session_id, "스트림 일시 실패: {}", reason);
        self.log(LogEvent::warning("WARNING: Потерян видеопоток"));

        match self.probe_camera().await {
            Some(ProbeOutcome::Reachable) => {
                self.log(LogEvent::info(
                    "Камера доступна по ping - проблема с RTSP потоком",
                ));
            }
            Some(ProbeOutcome::Unreachable) => {
                self.log(LogEvent::error("CRITICAL: Камера недоступна по ping!"));
                self.status(StatusEvent::reduced(
                    ConnectionLabel::CameraUnreachable,
                    true,
                ));
            }
            Some(ProbeOutcome::ProbeError(_)) => {
                self.log(LogEvent::warning("Не удалось выполнить ping-проверку камеры"));
            }
            None => {
                self.log(LogEvent::warning("Не удалось определить адрес камеры"));
            }
        }
    }

    /// 알림 활성화 처리 — 경고 후 도달성 검사
    async fn on_alert_raised(&self) {
        warn!(session_id = %self.session_id, "지속 품질 문제 알림 활성화");
        self.log(LogEvent::warning("ALERT: Проблема с качеством видео"));

        match self.probe_camera().await {
            Some(ProbeOutcome::Reachable) => {
                self.log(LogEvent::info(
                    "Камера доступна - проблема в качестве потока",
                ));
            }
            Some(ProbeOutcome::Unreachable) => {
                self.log(LogEvent::error("CRITICAL: Камера недоступна по ping!"));
            }
            Some(ProbeOutcome::ProbeError(_)) => {
                self.log(LogEvent::warning("Не удалось выполнить ping-проверку камеры"));
            }
            None => {
                self.log(LogEvent::warning("Не удалось определить адрес камеры"));
            }
        }
    }

    /// 호스트 추출 + 도달성 검사 (호스트 없으면 None)
    async fn probe_camera(&self) -> Option<ProbeOutcome> {
        let Some(host) = self.deps.probe.extract_host(&self.endpoint) else {
            warn!("엔드포인트에서 호스트 추출 실패");
            return None;
        };
        let outcome = self.deps.probe.probe(&host).await;
        match &outcome {
            ProbeOutcome::ProbeError(reason) => warn!("도달성 검사 실패 ({}): {}", host, reason),
            other => info!("도달성 검사 결과 ({}): {}", host, other),
        }
        Some(outcome)
    }

    /// 정지 신호와 경합하는 대기 — 정지 시 true
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = stop_signalled(&mut self.stop) => true,
        }
    }

    fn log(&self, event: LogEvent) {
        self.deps.publisher.publish_log(event);
    }

    fn status(&self, event: StatusEvent) {
        self.deps.publisher.publish_status(event);
    }
}

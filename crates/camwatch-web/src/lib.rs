//! # camwatch-web
//!
//! 카메라 모니터링 대시보드 서버.
//! Axum 기반 WebSocket/SSE 이벤트 스트림과 모니터링 제어 API를 제공한다.
//!
//! ## 기능
//! - `GET /ws` — 이벤트 수신 + 제어 명령 송신 (WebSocket)
//! - `GET /api/stream` — 이벤트 수신 (SSE)
//! - `POST /api/monitoring/start`, `POST /api/monitoring/stop`, `GET /api/monitoring/state`

pub mod error;
pub mod handlers;
pub mod hub;
pub mod routes;

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use camwatch_core::config::WebConfig;
use camwatch_monitor::SessionController;

pub use hub::EventHub;

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 단일 세션 컨트롤러
    pub controller: SessionController,
    /// 대시보드 이벤트 허브
    pub hub: EventHub,
}

/// 라우터 구성
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(handlers::ws::ws_handler))
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 대시보드 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// 서버 실행
    ///
    /// 기본 포트에서 시작하여, 포트가 이미 사용 중이면 다음 포트를 시도한다.
    /// 최대 10개 포트를 시도한 후 실패하면 에러를 반환한다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let app = router(self.state);

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let port = base_port.saturating_add(attempt);

            // 포트 오버플로우 체크
            if port == u16::MAX && attempt > 0 && base_port.saturating_add(attempt - 1) == u16::MAX {
                break;
            }

            let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {}:{} — {}", host, port, e);
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {} 사용 불가, 대체 포트 {} 사용", base_port, port);
                    }
                    info!("대시보드 서버 시작: http://{}", addr);

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("웹 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("대시보드 서버 종료");
                    return Ok(());
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::AddrInUse {
                        warn!("포트 {} 이미 사용 중, 다음 포트 시도...", port);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config() {
        let config = WebConfig::default();
        assert_eq!(config.port, 5000);
        assert!(!config.allow_external);
    }

    #[test]
    fn web_server_url() {
        let server = WebServer::new(WebConfig::default(), handlers::test_support::state());
        assert_eq!(server.url(), "http://localhost:5000");
    }

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn max_port_attempts_is_reasonable() {
        assert!(MAX_PORT_ATTEMPTS >= 1);
        assert!(MAX_PORT_ATTEMPTS <= 100);
    }

    #[tokio::test]
    async fn falls_back_when_port_taken() {
        // 점유된 포트에서 시작하면 다음 포트로 바인드되어야 한다
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = blocker.local_addr().unwrap().port();
        if taken == u16::MAX {
            return;
        }

        let config = WebConfig {
            port: taken,
            allow_external: false,
        };
        let server = WebServer::new(config, handlers::test_support::state());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(server.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send_replace(true);
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}

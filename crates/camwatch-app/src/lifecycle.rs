//! 라이프사이클 관리.
//!
//! 종료 신호 채널과 OS 시그널 대기.

use tokio::sync::watch;
use tracing::{error, info};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        self.shutdown_tx.send_replace(true);
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM)
    ///
    /// 대기만 한다. 종료 신호 발송은 세션 정리 후 호출자가 `shutdown()`으로 한다.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match (
                signal(SignalKind::interrupt()),
                signal(SignalKind::terminate()),
            ) {
                (Ok(mut sigint), Ok(mut sigterm)) => {
                    tokio::select! {
                        _ = sigint.recv() => info!("SIGINT 수신"),
                        _ = sigterm.recv() => info!("SIGTERM 수신"),
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    error!("시그널 핸들러 등록 실패: {e}");
                    Self::wait_ctrl_c().await;
                }
            }
        }

        #[cfg(not(unix))]
        Self::wait_ctrl_c().await;
    }

    async fn wait_ctrl_c() {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C 수신"),
            Err(e) => {
                // 시그널을 받을 수 없으면 프로세스 종료까지 대기
                error!("Ctrl+C 핸들러 등록 실패: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

//! 영구 로그 싱크.
//!
//! 허브의 `log_entry` 이벤트를 `YYYY-MM-DD HH:MM:SS [type] message` 한 줄씩
//! 파일에 추가 기록한다. 기록 실패는 tracing으로만 남기고 모니터링에 영향을 주지 않는다.

use std::path::PathBuf;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use camwatch_core::config::LogSinkConfig;
use camwatch_core::config_manager::ConfigManager;
use camwatch_core::error::CoreError;
use camwatch_core::models::event::{DashboardEvent, LogEvent};

/// 기본 로그 파일 이름
const LOG_FILE_NAME: &str = "log.txt";

/// 파일 로그 싱크
pub struct FileLogSink {
    path: PathBuf,
}

impl FileLogSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// 설정에서 로그 파일 경로 결정 (미지정 시 데이터 디렉토리의 log.txt)
    pub fn resolve_path(config: &LogSinkConfig) -> Result<PathBuf, CoreError> {
        match &config.path {
            Some(path) => Ok(path.clone()),
            None => Ok(ConfigManager::data_dir()?.join(LOG_FILE_NAME)),
        }
    }

    /// 로그 한 줄 추가
    pub async fn append(&self, log: &LogEvent) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut line = log.to_line();
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// 허브 구독 루프 — 종료 신호 또는 채널 닫힘까지 실행
    pub async fn run(
        self,
        mut events: broadcast::Receiver<DashboardEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("영구 로그 기록: {}", self.path.display());

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(DashboardEvent::LogEntry(log)) => {
                            if let Err(e) = self.append(&log).await {
                                warn!("로그 파일 기록 실패 ({}): {}", self.path.display(), e);
                            }
                        }
                        Ok(DashboardEvent::StatusUpdate(_)) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("로그 싱크 지연 - {}개 이벤트 누락", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        // 종료 직전 발행된 로그 마저 기록
        while let Ok(event) = events.try_recv() {
            if let DashboardEvent::LogEntry(log) = event {
                if let Err(e) = self.append(&log).await {
                    warn!("로그 파일 기록 실패 ({}): {}", self.path.display(), e);
                }
            }
        }
        debug!("영구 로그 싱크 종료");
    }
}

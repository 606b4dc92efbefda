//! ffmpeg 기반 스트림 소스.
//!
//! 엔드포인트를 ffmpeg 서브프로세스로 읽어 MJPEG(`image2pipe`)로 재인코딩한 뒤
//! stdout에서 JPEG 단위로 잘라 프레임을 만든다. 프레임 크기(JPEG 바이트 수)는
//! 장면 복잡도를 따라가므로 처리량 지표로 쓰인다.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use camwatch_core::config::StreamConfig;
use camwatch_core::error::CoreError;
use camwatch_core::models::frame::VideoFrame;
use camwatch_core::models::session::redact_credentials;
use camwatch_core::ports::stream::{FrameRead, StreamConnector, StreamSource};

use crate::mjpeg::MjpegSplitter;

/// stdout 읽기 청크 크기
const READ_CHUNK: usize = 64 * 1024;

/// ffmpeg 스트림 소스 생성기 — 세션마다 새 소스
#[derive(Debug, Clone)]
pub struct FfmpegConnector {
    config: StreamConfig,
}

impl FfmpegConnector {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }
}

impl StreamConnector for FfmpegConnector {
    fn create(&self) -> Box<dyn StreamSource> {
        Box::new(FfmpegStreamSource::new(self.config.clone()))
    }
}

/// ffmpeg MJPEG 파이프 스트림 소스
pub struct FfmpegStreamSource {
    config: StreamConfig,
    endpoint: Option<String>,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    splitter: MjpegSplitter,
    /// open()에서 받은 첫 프레임 (다음 read_frame에서 반환)
    pending: Option<VideoFrame>,
    read_buf: Vec<u8>,
}

impl FfmpegStreamSource {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            endpoint: None,
            child: None,
            stdout: None,
            splitter: MjpegSplitter::default(),
            pending: None,
            read_buf: vec![0u8; READ_CHUNK],
        }
    }

    /// ffmpeg 인자 구성
    pub fn build_args(endpoint: &str, scale_width: Option<u32>) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        if endpoint.starts_with("rtsp://") || endpoint.starts_with("rtsps://") {
            args.extend(["-rtsp_transport".to_string(), "tcp".to_string()]);
        }
        args.extend(["-i".to_string(), endpoint.to_string()]);

        if let Some(width) = scale_width {
            args.extend(["-vf".to_string(), format!("scale={width}:-2")]);
        }

        args.extend(
            ["-an", "-f", "image2pipe", "-c:v", "mjpeg", "-q:v", "5", "pipe:1"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    fn spawn(&mut self, endpoint: &str) -> Result<(), CoreError> {
        let args = Self::build_args(endpoint, self.config.scale_width);
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CoreError::Internal("ffmpeg stdout 파이프 없음".to_string()))?;

        debug!(
            "ffmpeg 실행: pid={:?}, endpoint={}",
            child.id(),
            redact_credentials(endpoint)
        );
        self.splitter.clear();
        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }

    /// 서브프로세스 종료 (엔드포인트는 유지 — 재연결 가능)
    fn terminate(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                debug!("ffmpeg 종료 신호 실패 (이미 종료됨): {}", e);
            }
        }
        self.splitter.clear();
    }

    async fn next_jpeg(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        next_jpeg(stdout, &mut self.splitter, &mut self.read_buf).await
    }
}

/// 완성된 JPEG 하나를 읽을 때까지 stdout 소비 (EOF → None)
async fn next_jpeg(
    stdout: &mut ChildStdout,
    splitter: &mut MjpegSplitter,
    buf: &mut [u8],
) -> std::io::Result<Option<Vec<u8>>> {
    loop {
        if let Some(frame) = splitter.next_frame() {
            return Ok(Some(frame));
        }
        let n = stdout.read(buf).await?;
        if n == 0 {
            return Ok(None);
        }
        splitter.push(&buf[..n]);
    }
}

#[async_trait]
impl StreamSource for FfmpegStreamSource {
    async fn open(&mut self, endpoint: &str) -> Result<(), CoreError> {
        let redacted = redact_credentials(endpoint);
        let open_err = |reason: String| CoreError::StreamOpen {
            endpoint: redacted.clone(),
            reason,
        };

        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(open_err("빈 엔드포인트".to_string()));
        }

        self.close();
        self.spawn(endpoint)
            .map_err(|e| open_err(format!("ffmpeg 실행 실패: {e}")))?;

        let first = tokio::time::timeout(self.config.open_timeout(), self.next_jpeg()).await;
        let reason = match first {
            Ok(Ok(Some(bytes))) => {
                info!("스트림 연결 성공: {} (첫 프레임 {} bytes)", redacted, bytes.len());
                self.pending = Some(VideoFrame::new(bytes));
                self.endpoint = Some(endpoint.to_string());
                return Ok(());
            }
            Ok(Ok(None)) => "첫 프레임 전에 ffmpeg 종료".to_string(),
            Ok(Err(e)) => format!("stdout 읽기 실패: {e}"),
            Err(_) => format!(
                "첫 프레임 수신 타임아웃 ({}ms)",
                self.config.open_timeout_ms
            ),
        };

        self.terminate();
        Err(open_err(reason))
    }

    async fn read_frame(&mut self) -> Result<FrameRead, CoreError> {
        if let Some(frame) = self.pending.take() {
            return Ok(FrameRead::Frame(frame));
        }

        let Some(endpoint) = self.endpoint.clone() else {
            return Err(CoreError::Stream("열리지 않은 스트림".to_string()));
        };

        if self.child.is_none() {
            if !self.config.reconnect_on_eof {
                return Ok(FrameRead::EndOfStream);
            }
            if let Err(e) = self.spawn(&endpoint) {
                return Ok(FrameRead::Transient(format!("ffmpeg 재실행 실패: {e}")));
            }
            info!("ffmpeg 재실행: {}", redact_credentials(&endpoint));
        }

        match tokio::time::timeout(self.config.read_timeout(), self.next_jpeg()).await {
            Ok(Ok(Some(bytes))) => Ok(FrameRead::Frame(VideoFrame::new(bytes))),
            Ok(Ok(None)) => {
                warn!("ffmpeg 스트림 종료 (EOF)");
                self.terminate();
                if self.config.reconnect_on_eof {
                    Ok(FrameRead::Transient("stream lost".to_string()))
                } else {
                    Ok(FrameRead::EndOfStream)
                }
            }
            Ok(Err(e)) => {
                warn!("ffmpeg stdout 읽기 실패: {}", e);
                self.terminate();
                Ok(FrameRead::Transient(format!("read error: {e}")))
            }
            Err(_) => Ok(FrameRead::Transient(format!(
                "no frame within {}ms",
                self.config.read_timeout_ms
            ))),
        }
    }

    fn close(&mut self) {
        self.terminate();
        self.pending = None;
        self.endpoint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StreamConfig {
        StreamConfig {
            ffmpeg_path: "/nonexistent/camwatch-ffmpeg".to_string(),
            open_timeout_ms: 200,
            ..StreamConfig::default()
        }
    }

    #[test]
    fn rtsp_args_use_tcp_transport() {
        let args = FfmpegStreamSource::build_args("rtsp://cam/live", None);
        let i = args.iter().position(|a| a == "-rtsp_transport").unwrap();
        assert_eq!(args[i + 1], "tcp");
        assert!(i < args.iter().position(|a| a == "-i").unwrap());
        assert_eq!(args.last().unwrap(), "pipe:1");
        assert!(args.windows(2).any(|w| w == ["-f", "image2pipe"]));
        assert!(!args.iter().any(|a| a == "-vf"));
    }

    #[test]
    fn http_args_without_transport_with_scale() {
        let args = FfmpegStreamSource::build_args("http://cam/video.mjpg", Some(640));
        assert!(!args.iter().any(|a| a == "-rtsp_transport"));
        assert!(args.windows(2).any(|w| w == ["-vf", "scale=640:-2"]));
    }

    #[tokio::test]
    async fn open_fails_when_ffmpeg_missing() {
        let mut source = FfmpegStreamSource::new(config());
        let err = source.open("rtsp://admin:pw@cam/live").await.unwrap_err();
        match err {
            CoreError::StreamOpen { endpoint, .. } => {
                assert_eq!(endpoint, "rtsp://***@cam/live");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_rejects_empty_endpoint() {
        let mut source = FfmpegStreamSource::new(config());
        assert!(matches!(
            source.open("  ").await,
            Err(CoreError::StreamOpen { .. })
        ));
    }

    #[tokio::test]
    async fn read_before_open_is_error() {
        let mut source = FfmpegStreamSource::new(config());
        assert!(matches!(
            source.read_frame().await,
            Err(CoreError::Stream(_))
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let mut source = FfmpegStreamSource::new(config());
        source.close();
        source.close();
        assert!(source.child.is_none());
    }

    #[test]
    fn connector_creates_fresh_sources() {
        let connector = FfmpegConnector::new(config());
        let mut a = connector.create();
        let mut b = connector.create();
        a.close();
        b.close();
    }
}

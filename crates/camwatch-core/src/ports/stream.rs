//! 비디오 스트림 소스 포트.
//!
//! 구현: `camwatch-network` crate (ffmpeg MJPEG 파이프)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::VideoFrame;

/// 프레임 읽기 결과
#[derive(Debug)]
pub enum FrameRead {
    /// 정상 프레임
    Frame(VideoFrame),
    /// 일시적 실패 (스트림 끊김 등) — 루프는 계속 폴링한다
    Transient(String),
    /// 스트림 소진 — 세션 종료
    EndOfStream,
}

/// 스트림 소스 — 세션당 하나, 워커 태스크가 독점 소유
#[async_trait]
pub trait StreamSource: Send {
    /// 엔드포인트 연결 (사전 조건 검사, 재시도 없음)
    ///
    /// 실패는 세션에 치명적이다.
    async fn open(&mut self, endpoint: &str) -> Result<(), CoreError>;

    /// 다음 프레임 읽기
    ///
    /// `Err`는 복구 불가능한 루프 에러로 취급된다.
    async fn read_frame(&mut self) -> Result<FrameRead, CoreError>;

    /// 하위 리소스 해제 — 무조건, 멱등
    fn close(&mut self);
}

/// 스트림 소스 생성기 — 세션 시작마다 새 소스를 만든다
pub trait StreamConnector: Send + Sync {
    fn create(&self) -> Box<dyn StreamSource>;
}

//! # camwatch-network
//!
//! 카메라 스트림 및 네트워크 진단 어댑터.
//!
//! - [`stream`] — ffmpeg 서브프로세스 기반 `StreamSource` (MJPEG 파이프)
//! - [`mjpeg`] — MJPEG 바이트 스트림 프레임 분할기
//! - [`reachability`] — 엔드포인트 호스트 추출 및 ping 도달성 검사

pub mod mjpeg;
pub mod reachability;
pub mod stream;

pub use reachability::{extract_host, PingProbe};
pub use stream::{FfmpegConnector, FfmpegStreamSource};

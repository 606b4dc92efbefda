//! 비디오 프레임 모델.

use std::time::Instant;

/// 스트림에서 수신한 인코딩된 프레임 (MJPEG 단일 JPEG)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 인코딩된 프레임 바이트
    pub payload: Vec<u8>,
    /// 수신 시각 (단조 시계)
    pub received_at: Instant,
}

impl VideoFrame {
    /// 현재 시각으로 프레임 생성
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            received_at: Instant::now(),
        }
    }

    /// 처리량 지표 — 프레임 크기 × 8 (프레임당 비트)
    pub fn size_bits(&self) -> f64 {
        (self.payload.len() as f64) * 8.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_bits_is_bytes_times_eight() {
        let frame = VideoFrame::new(vec![0u8; 1250]);
        assert_eq!(frame.size_bits(), 10_000.0);
    }
}

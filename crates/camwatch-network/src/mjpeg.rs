//! MJPEG 프레임 분할기.
//!
//! `image2pipe` 출력은 JPEG가 구분자 없이 연속된 바이트 스트림이다.
//! SOI(`FF D8`) ~ EOI(`FF D9`) 구간을 하나의 프레임으로 잘라낸다.

use tracing::debug;

/// JPEG 시작 마커
const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG 종료 마커
const EOI: [u8; 2] = [0xFF, 0xD9];

/// 버퍼 상한 기본값 (16 MiB) — 초과 시 미완성 데이터 폐기
pub const DEFAULT_MAX_BUFFER: usize = 16 * 1024 * 1024;

/// 증분 MJPEG 분할기
#[derive(Debug)]
pub struct MjpegSplitter {
    buffer: Vec<u8>,
    max_buffer: usize,
    /// 다음 EOI 탐색 시작 위치 (이미 검사한 구간 재탐색 방지)
    scan_from: usize,
}

impl Default for MjpegSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER)
    }
}

impl MjpegSplitter {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(64 * 1024),
            max_buffer: max_buffer.max(4),
            scan_from: 0,
        }
    }

    /// 수신 바이트 추가
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        if self.buffer.len() > self.max_buffer {
            debug!(
                "MJPEG 버퍼 상한 초과 ({} bytes) - 미완성 데이터 폐기",
                self.buffer.len()
            );
            self.clear();
        }
    }

    /// 완성된 다음 프레임 추출
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        // SOI 이전 쓰레기 제거
        match find(&self.buffer, &SOI, 0) {
            Some(0) => {}
            Some(start) => {
                debug!("SOI 이전 {} bytes 폐기", start);
                self.buffer.drain(..start);
                self.scan_from = 0;
            }
            None => {
                // 마지막 0xFF는 다음 청크의 SOI 앞부분일 수 있음
                let keep = usize::from(self.buffer.last() == Some(&0xFF));
                let drop = self.buffer.len() - keep;
                self.buffer.drain(..drop);
                self.scan_from = 0;
                return None;
            }
        }

        let from = self.scan_from.max(SOI.len());
        match find(&self.buffer, &EOI, from) {
            Some(eoi) => {
                let end = eoi + EOI.len();
                let frame: Vec<u8> = self.buffer.drain(..end).collect();
                self.scan_from = 0;
                Some(frame)
            }
            None => {
                // 경계에 걸친 마커를 위해 1바이트 겹쳐서 다음 탐색
                self.scan_from = self.buffer.len().saturating_sub(1).max(SOI.len());
                None
            }
        }
    }

    /// 버퍼에 남은 바이트 수
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    if haystack.len() < from + 2 {
        return None;
    }
    haystack[from..]
        .windows(2)
        .position(|w| w == needle)
        .map(|p| p + from)
}

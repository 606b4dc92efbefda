//! CAMWATCH 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입에서 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 설정, 스트림, 프레임 디코딩, 네트워크 진단 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 스트림 연결 실패 (세션 종료 사유, 재시도 없음)
    #[error("스트림 연결 실패 ({endpoint}): {reason}")]
    StreamOpen {
        /// 스트림 엔드포인트 (자격증명 제거됨)
        endpoint: String,
        /// 실패 사유
        reason: String,
    },

    /// 스트림 처리 중 복구 불가능한 에러
    #[error("스트림 에러: {0}")]
    Stream(String),

    /// 프레임 디코딩 실패
    #[error("프레임 디코딩 실패: {0}")]
    Decode(String),

    /// 도달성 검사 실행 실패
    #[error("도달성 검사 실패: {0}")]
    Probe(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_open_display_contains_endpoint() {
        let err = CoreError::StreamOpen {
            endpoint: "rtsp://10.0.0.5:554/live".to_string(),
            reason: "첫 프레임 수신 타임아웃".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rtsp://10.0.0.5:554/live"));
        assert!(msg.contains("타임아웃"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "ffmpeg");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}

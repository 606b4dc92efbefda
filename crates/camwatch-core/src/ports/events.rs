//! 대시보드 이벤트 발행 포트.
//!
//! 구현: `camwatch-web` crate (`EventHub`, tokio broadcast)
//!
//! 전달 보장: 호출당 1회 시도(at-most-once). 확인 응답, 재시도, 배압 없음.
//! 느리거나 없는 구독자가 모니터링 루프를 막아서는 안 된다.

use crate::models::event::{LogEvent, StatusEvent};

/// 이벤트 발행기
pub trait EventPublisher: Send + Sync {
    /// 상태 스냅샷 발행
    fn publish_status(&self, status: StatusEvent);

    /// 로그 라인 발행
    fn publish_log(&self, log: LogEvent);
}

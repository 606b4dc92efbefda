//! 대시보드 이벤트 허브.
//!
//! tokio broadcast 채널 기반 `EventPublisher` 구현.
//! 호출당 1회 전송 시도만 하며, 구독자가 없거나 느려도 발행측은 막히지 않는다.
//! 지연된 수신자는 밀린 이벤트를 건너뛴다.

use tokio::sync::broadcast;
use tracing::trace;

use camwatch_core::models::event::{DashboardEvent, LogEvent, StatusEvent};
use camwatch_core::ports::events::EventPublisher;

/// 이벤트 브로드캐스트 채널 용량
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 이벤트 허브
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 새 구독자 — 구독 시점 이후 이벤트만 수신 (이력 재생 없음)
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// 현재 구독자 수
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, event: DashboardEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            trace!("구독자 없음 - {} 이벤트 폐기", name);
        }
    }
}

impl EventPublisher for EventHub {
    fn publish_status(&self, status: StatusEvent) {
        self.send(DashboardEvent::StatusUpdate(status));
    }

    fn publish_log(&self, log: LogEvent) {
        self.send(DashboardEvent::LogEntry(log));
    }
}

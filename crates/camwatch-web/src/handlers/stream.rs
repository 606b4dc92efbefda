//! SSE 실시간 스트림 핸들러.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use camwatch_core::models::event::DashboardEvent;

use super::greeting;
use crate::AppState;

/// SSE 스트림 엔드포인트
///
/// GET /api/stream
///
/// 접속 인사 후 허브 이벤트를 전송한다. SSE event 이름은 이벤트 종류
/// (`log_entry` / `status_update`), data는 본문 JSON.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // 인사 전에 구독해야 사이 이벤트를 놓치지 않는다
    let rx = state.hub.subscribe();
    let hello = tokio_stream::once(DashboardEvent::LogEntry(greeting()));
    let events = BroadcastStream::new(rx).filter_map(|result| result.ok()); // 지연 시 스킵

    let sse_stream = hello.chain(events).filter_map(|event| {
        let data = event.data_json().ok()?;
        Some(Ok(Event::default().event(event.name()).data(data)))
    });

    Sse::new(sse_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use axum::response::IntoResponse;
    use camwatch_core::models::event::StatusEvent;

    #[test]
    fn status_event_body_is_flat() {
        let event = DashboardEvent::StatusUpdate(StatusEvent::inactive());
        assert_eq!(event.name(), "status_update");
        let data = event.data_json().unwrap();
        assert_eq!(data, r#"{"connectionStatus":"Не активно","alert":false}"#);
    }

    #[tokio::test]
    async fn sse_response_has_event_stream_content_type() {
        let state = test_support::state();
        let response = event_stream(State(state.clone())).await.into_response();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));
        // 응답 스트림이 살아 있는 동안 구독 유지
        assert_eq!(state.hub.subscriber_count(), 1);
    }
}

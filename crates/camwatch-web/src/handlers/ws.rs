//! 대시보드 WebSocket 핸들러.
//!
//! 접속 시 해당 클라이언트에게만 인사 로그를 보내고, 이후 허브 이벤트를
//! `{"event": ..., "data": ...}` 텍스트 프레임으로 전달한다.
//! 클라이언트가 보내는 텍스트 프레임은 제어 명령으로 해석한다.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use camwatch_core::models::command::ControlCommand;
use camwatch_core::models::event::{DashboardEvent, LogEvent};

use super::{apply_command, greeting};
use crate::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 이벤트를 텍스트 프레임으로 직렬화
pub fn encode_event(event: &DashboardEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!("이벤트 직렬화 실패: {}", e);
            None
        }
    }
}

/// 수신 텍스트 처리 — 잘못된 명령이면 해당 클라이언트에게 보낼 에러 로그 반환
fn handle_command(state: &AppState, text: &str) -> Option<DashboardEvent> {
    match ControlCommand::from_json(text) {
        Ok(command) => {
            debug!("제어 명령 수신: {:?}", command);
            apply_command(&state.controller, command);
            None
        }
        Err(e) => {
            debug!("잘못된 제어 명령: {}", e);
            Some(DashboardEvent::LogEntry(LogEvent::error(
                "ERROR: Некорректная команда управления",
            )))
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.hub.subscribe();
    info!("대시보드 클라이언트 연결 (구독자 {})", state.hub.subscriber_count());

    let hello = DashboardEvent::LogEntry(greeting());
    if let Some(msg) = encode_event(&hello) {
        if sender.send(msg).await.is_err() {
            debug!("인사 전송 실패 - 클라이언트 연결 끊김");
            return;
        }
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_command(&state, text.as_str()) {
                            if let Some(msg) = encode_event(&reply) {
                                if sender.send(msg).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("WebSocket 에러: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Some(msg) = encode_event(&event) {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("대시보드 클라이언트 지연 - {}개 이벤트 건너뜀", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("대시보드 클라이언트 연결 종료");
}

//! 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성 (`/api` 하위)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 실시간 스트림 (SSE)
        .route("/stream", get(handlers::stream::event_stream))
        // 모니터링 제어
        .route(
            "/monitoring/start",
            post(handlers::control::start_monitoring),
        )
        .route("/monitoring/stop", post(handlers::control::stop_monitoring))
        .route("/monitoring/state", get(handlers::control::get_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn routes_compile() {
        let _router: Router<()> = api_routes().with_state(test_support::state());
    }

    #[tokio::test]
    async fn state_endpoint_reports_idle() {
        let app = api_routes().with_state(test_support::state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/monitoring/state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_requires_post() {
        let app = api_routes().with_state(test_support::state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/monitoring/start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

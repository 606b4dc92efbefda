//! 이상 탐지 및 알림 디바운스.
//!
//! 처리량/프레임레이트 급락 규칙과, 순간 신호를 지속 알림으로 바꾸는 카운터.
//! 임계값은 경험적으로 조정된 값이며 동작 호환성을 위해 그대로 유지한다.

use crate::metrics_window::MetricsWindow;

/// 처리량 규칙 — 필요 최소 이력 / 평균 구간
pub const THROUGHPUT_WINDOW: usize = 30;
/// 처리량 규칙 — 평균 대비 급락 비율
pub const THROUGHPUT_DROP_RATIO: f64 = 0.3;
/// 처리량 규칙 — 평균 하한 (이하이면 판정 안 함)
pub const THROUGHPUT_MIN_AVERAGE: f64 = 1000.0;

/// 프레임레이트 규칙 — 필요 최소 이력 / 평균 구간
pub const FRAME_RATE_WINDOW: usize = 10;
/// 프레임레이트 규칙 — 절대 하한 (fps)
pub const FRAME_RATE_FLOOR: f64 = 5.0;
/// 프레임레이트 규칙 — 평균 대비 급락 비율
pub const FRAME_RATE_DROP_RATIO: f64 = 0.2;
/// 프레임레이트 규칙 — 비율 판정을 위한 평균 하한
pub const FRAME_RATE_MIN_AVERAGE: f64 = 10.0;

/// 알림 활성화 임계값 (연속 문제 평가 횟수)
pub const ALERT_THRESHOLD: u32 = 3;

/// 처리량 급락 판정
///
/// 이력 30개 미만이면 항상 false.
pub fn throughput_drop(window: &MetricsWindow, current: f64) -> bool {
    if window.throughput_len() < THROUGHPUT_WINDOW {
        return false;
    }
    let average = window.average_throughput(THROUGHPUT_WINDOW);
    current < THROUGHPUT_DROP_RATIO * average && average > THROUGHPUT_MIN_AVERAGE
}

/// 프레임레이트 급락 판정
///
/// 이력 10개 미만이면 항상 false.
pub fn frame_rate_drop(window: &MetricsWindow, current_fps: f64) -> bool {
    if window.frame_rate_len() < FRAME_RATE_WINDOW {
        return false;
    }
    let average = window.average_frame_rate(FRAME_RATE_WINDOW);
    current_fps < FRAME_RATE_FLOOR
        || (average > FRAME_RATE_MIN_AVERAGE && current_fps < FRAME_RATE_DROP_RATIO * average)
}

/// 평가 1회 후 알림 상태 변화
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    /// 비활성 → 활성
    Raised,
    /// 활성 유지
    Held,
    /// 활성 → 비활성
    Cleared,
    /// 비활성 유지
    Quiet,
}

/// 지속 문제 카운터
///
/// 문제 평가마다 +1, 정상 평가마다 -1 (0 미만 없음).
/// 카운터가 임계값 이상인 동안만 알림이 활성이다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    count: u32,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.count >= ALERT_THRESHOLD
    }

    /// 평가 결과 반영
    pub fn tick(&mut self, problem: bool) -> AlertTransition {
        let was_active = self.is_active();
        if problem {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = self.count.saturating_sub(1);
        }
        match (was_active, self.is_active()) {
            (false, true) => AlertTransition::Raised,
            (true, true) => AlertTransition::Held,
            (true, false) => AlertTransition::Cleared,
            (false, false) => AlertTransition::Quiet,
        }
    }
}

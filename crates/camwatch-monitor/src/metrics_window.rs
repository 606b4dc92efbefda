//! 스트림 지표 슬라이딩 윈도우.
//!
//! 처리량/프레임레이트 샘플의 최근 이력을 삽입 순서대로 보관한다.
//! 세션 워커 태스크가 독점 소유하므로 동기화가 필요 없다.

use std::collections::VecDeque;
use std::time::Instant;

/// 처리량 이력 상한 (평가 윈도우 30 × 2)
pub const THROUGHPUT_CAPACITY: usize = 60;

/// 프레임레이트 이력 상한
pub const FRAME_RATE_CAPACITY: usize = 20;

/// 최근 처리량/프레임레이트 이력
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    throughput: VecDeque<f64>,
    frame_rate: VecDeque<f64>,
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsWindow {
    pub fn new() -> Self {
        Self {
            throughput: VecDeque::with_capacity(THROUGHPUT_CAPACITY + 1),
            frame_rate: VecDeque::with_capacity(FRAME_RATE_CAPACITY + 1),
        }
    }

    /// 처리량 샘플 추가 (상한 초과 시 가장 오래된 샘플 제거)
    pub fn record_throughput(&mut self, bits: f64) {
        push_bounded(&mut self.throughput, bits, THROUGHPUT_CAPACITY);
    }

    /// 프레임레이트 샘플 추가
    pub fn record_frame_rate(&mut self, fps: f64) {
        push_bounded(&mut self.frame_rate, fps, FRAME_RATE_CAPACITY);
    }

    /// 최근 `n`개 처리량 평균 (부족하면 전체, 비어 있으면 0)
    pub fn average_throughput(&self, n: usize) -> f64 {
        trailing_mean(&self.throughput, n)
    }

    /// 최근 `n`개 프레임레이트 평균
    pub fn average_frame_rate(&self, n: usize) -> f64 {
        trailing_mean(&self.frame_rate, n)
    }

    pub fn throughput_len(&self) -> usize {
        self.throughput.len()
    }

    pub fn frame_rate_len(&self) -> usize {
        self.frame_rate.len()
    }
}

/// 프레임 간격 기반 fps 측정
///
/// 첫 프레임은 기준 시각만 기록하고 샘플을 내지 않는다.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 수신 시각 기록 후 직전 프레임 대비 fps (간격 0이면 0)
    pub fn tick(&mut self, received_at: Instant) -> Option<f64> {
        let previous = self.last.replace(received_at)?;
        let interval = received_at
            .saturating_duration_since(previous)
            .as_secs_f64();
        Some(if interval > 0.0 { 1.0 / interval } else { 0.0 })
    }
}

fn push_bounded(history: &mut VecDeque<f64>, value: f64, capacity: usize) {
    history.push_back(value);
    while history.len() > capacity {
        history.pop_front();
    }
}

fn trailing_mean(history: &VecDeque<f64>, n: usize) -> f64 {
    let take = n.min(history.len());
    if take == 0 {
        return 0.0;
    }
    history.iter().rev().take(take).sum::<f64>() / take as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn frame_clock_skips_first_frame() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(start), None);

        let fps = clock.tick(start + Duration::from_millis(100)).unwrap();
        assert!((fps - 10.0).abs() < 1e-9);
        // 동일 시각 프레임
        assert_eq!(clock.tick(start + Duration::from_millis(100)), Some(0.0));
    }

    #[test]
    fn frame_clock_ignores_earlier_baseline() {
        // 연결 중 버퍼링된 프레임처럼 활성화 이전 시각이어도 간격은 프레임끼리 잰다
        let start = Instant::now();
        let mut clock = FrameClock::new();
        clock.tick(start);
        let fps = clock.tick(start + Duration::from_millis(40)).unwrap();
        assert!((fps - 25.0).abs() < 1e-9);
    }

    #[test]
    fn evicts_oldest_throughput() {
        let mut window = MetricsWindow::new();
        for i in 0..(THROUGHPUT_CAPACITY + 5) {
            window.record_throughput(i as f64);
        }
        assert_eq!(window.throughput_len(), THROUGHPUT_CAPACITY);
        // 남은 샘플: 5..65
        assert_eq!(window.average_throughput(THROUGHPUT_CAPACITY), 34.5);
    }

    #[test]
    fn frame_rate_bound_is_independent() {
        let mut window = MetricsWindow::new();
        for _ in 0..50 {
            window.record_frame_rate(25.0);
            window.record_throughput(1.0);
        }
        assert_eq!(window.frame_rate_len(), FRAME_RATE_CAPACITY);
        assert_eq!(window.throughput_len(), 50);
    }

    #[test]
    fn trailing_average_uses_last_n() {
        let mut window = MetricsWindow::new();
        for v in [100.0, 100.0, 10.0, 20.0] {
            window.record_frame_rate(v);
        }
        assert_eq!(window.average_frame_rate(2), 15.0);
        // 부족하면 전체 평균
        assert_eq!(window.average_frame_rate(10), 57.5);
    }

    #[test]
    fn empty_average_is_zero() {
        let window = MetricsWindow::default();
        assert_eq!(window.average_throughput(30), 0.0);
        assert_eq!(window.average_frame_rate(0), 0.0);
    }
}

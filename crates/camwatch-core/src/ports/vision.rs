//! 프레임 품질 분석 포트.
//!
//! 구현: `camwatch-vision` crate (image)

use crate::error::CoreError;
use crate::models::frame::VideoFrame;
use crate::models::quality::QualityMetrics;

/// 프레임 품질 분석기 (advanced 모드에서만 호출)
pub trait QualityAnalyzer: Send + Sync {
    /// 밝기/선명도/대비 측정 및 플래그 도출
    fn analyze(&self, frame: &VideoFrame) -> Result<QualityMetrics, CoreError>;
}

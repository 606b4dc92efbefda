//! # camwatch-vision
//!
//! 프레임 품질 분석 크레이트.
//! advanced 모드에서 프레임별 밝기, 선명도, 대비를 측정하여
//! 검은/흰 화면, 흐림, 저대비를 판정한다.

pub mod quality;

pub use quality::LumaQualityAnalyzer;

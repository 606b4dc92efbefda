//! 프레임 이미지 품질 지표.
//!
//! 밝기/선명도/대비 측정값에서 고정 임계값으로 플래그를 도출하고,
//! 우선순위에 따라 대시보드 품질 라벨을 선택한다.

use serde::Serialize;
use std::fmt;

/// 검은 화면 판정 — 평균 밝기 미만
pub const BLACK_SCREEN_MAX_BRIGHTNESS: f64 = 10.0;

/// 흰 화면 판정 — 평균 밝기 초과
pub const WHITE_SCREEN_MIN_BRIGHTNESS: f64 = 240.0;

/// 흐림 판정 — 라플라시안 분산 미만
pub const BLURRY_MAX_SHARPNESS: f64 = 50.0;

/// 저대비 판정 — 휘도 표준편차 미만
pub const LOW_CONTRAST_MAX_STDDEV: f64 = 20.0;

/// 단일 프레임 품질 지표 (advanced 모드 전용)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// 평균 휘도 (0~255)
    pub brightness: f64,
    /// 라플라시안 응답 분산
    pub sharpness: f64,
    /// 휘도 표준편차
    pub contrast: f64,
    pub black_screen: bool,
    pub white_screen: bool,
    pub blurry: bool,
    pub low_contrast: bool,
}

impl QualityMetrics {
    /// 측정값에 임계값을 적용하여 지표 생성
    pub fn from_measurements(brightness: f64, sharpness: f64, contrast: f64) -> Self {
        Self {
            brightness,
            sharpness,
            contrast,
            black_screen: brightness < BLACK_SCREEN_MAX_BRIGHTNESS,
            white_screen: brightness > WHITE_SCREEN_MIN_BRIGHTNESS,
            blurry: sharpness < BLURRY_MAX_SHARPNESS,
            low_contrast: contrast < LOW_CONTRAST_MAX_STDDEV,
        }
    }

    /// 품질 라벨 선택
    ///
    /// 우선순위: 검은 화면 > 흰 화면 > 흐림 > 저대비 > 양호 (첫 매칭 채택)
    pub fn label(&self) -> QualityLabel {
        if self.black_screen {
            QualityLabel::BlackScreen
        } else if self.white_screen {
            QualityLabel::WhiteScreen
        } else if self.blurry {
            QualityLabel::Blurry
        } else if self.low_contrast {
            QualityLabel::LowContrast
        } else {
            QualityLabel::Good
        }
    }
}

/// 대시보드 품질 라벨
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum QualityLabel {
    #[default]
    Good,
    BlackScreen,
    WhiteScreen,
    Blurry,
    LowContrast,
}

impl QualityLabel {
    /// 대시보드 표시 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Good => "Хорошее",
            QualityLabel::BlackScreen => "Черный экран",
            QualityLabel::WhiteScreen => "Белый экран",
            QualityLabel::Blurry => "Размытое",
            QualityLabel::LowContrast => "Низкая контрастность",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

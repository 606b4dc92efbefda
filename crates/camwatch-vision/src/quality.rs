//! 프레임 품질 분석.
//!
//! `QualityAnalyzer` 포트 구현. JPEG → 8비트 휘도 변환 후
//! 평균 밝기, 라플라시안 분산(선명도), 휘도 표준편차(대비)를 측정한다.
//! 포인터 직접 접근 대신 원시 버퍼 인덱싱으로 픽셀을 순회한다.

use camwatch_core::error::CoreError;
use camwatch_core::models::frame::VideoFrame;
use camwatch_core::models::quality::QualityMetrics;
use camwatch_core::ports::vision::QualityAnalyzer;
use image::GrayImage;
use tracing::debug;

/// 휘도 기반 품질 분석기 — `QualityAnalyzer` 포트 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct LumaQualityAnalyzer;

impl LumaQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl QualityAnalyzer for LumaQualityAnalyzer {
    fn analyze(&self, frame: &VideoFrame) -> Result<QualityMetrics, CoreError> {
        let gray = decode_luma(&frame.payload)?;
        let metrics = measure(&gray)?;
        debug!(
            "품질 측정: 밝기={:.1}, 선명도={:.1}, 대비={:.1}",
            metrics.brightness, metrics.sharpness, metrics.contrast
        );
        Ok(metrics)
    }
}

/// 인코딩된 프레임을 8비트 휘도 이미지로 디코딩
pub fn decode_luma(payload: &[u8]) -> Result<GrayImage, CoreError> {
    let image = image::load_from_memory(payload).map_err(|e| CoreError::Decode(e.to_string()))?;
    Ok(image.to_luma8())
}

/// 휘도 이미지 품질 측정
pub fn measure(gray: &GrayImage) -> Result<QualityMetrics, CoreError> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(CoreError::Decode(format!("빈 프레임 ({w}x{h})")));
    }

    let raw = gray.as_raw();
    let n = raw.len() as f64;

    let brightness = raw.iter().map(|&p| p as f64).sum::<f64>() / n;
    let luma_var = raw
        .iter()
        .map(|&p| {
            let d = p as f64 - brightness;
            d * d
        })
        .sum::<f64>()
        / n;
    let contrast = luma_var.sqrt();
    let sharpness = laplacian_variance(raw, w as usize, h as usize);

    Ok(QualityMetrics::from_measurements(
        brightness, sharpness, contrast,
    ))
}

/// 4-이웃 라플라시안 `[[0,1,0],[1,-4,1],[0,1,0]]` 응답의 모분산
///
/// 경계는 reflect-101 (가장자리 픽셀 제외 반사) 처리.
fn laplacian_variance(raw: &[u8], w: usize, h: usize) -> f64 {
    let px = |x: usize, y: usize| raw[y * w + x] as f64;

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;

    for y in 0..h {
        let up = reflect101(y as isize - 1, h);
        let down = reflect101(y as isize + 1, h);
        for x in 0..w {
            let left = reflect101(x as isize - 1, w);
            let right = reflect101(x as isize + 1, w);
            let response =
                px(x, up) + px(x, down) + px(left, y) + px(right, y) - 4.0 * px(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = (w * h) as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// reflect-101 인덱스 (`dcb|abcd|cba`)
#[inline]
fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i > last {
        i = 2 * last - i;
    }
    i.clamp(0, last) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use camwatch_core::models::quality::QualityLabel;
    use image::{DynamicImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn uniform(w: u32, h: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([value]))
    }

    fn checkerboard(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    fn encode_jpeg(gray: GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn black_frame_is_black_screen() {
        let m = measure(&uniform(64, 48, 3)).unwrap();
        assert!((m.brightness - 3.0).abs() < 1e-9);
        assert!(m.black_screen);
        assert!(m.blurry);
        assert!(m.low_contrast);
        assert_eq!(m.label(), QualityLabel::BlackScreen);
    }

    #[test]
    fn white_frame_is_white_screen() {
        let m = measure(&uniform(32, 32, 250)).unwrap();
        assert!(m.white_screen);
        assert!(!m.black_screen);
        assert_eq!(m.label(), QualityLabel::WhiteScreen);
    }

    #[test]
    fn flat_gray_is_blurry_not_low_contrast_label() {
        let m = measure(&uniform(40, 30, 128)).unwrap();
        assert_eq!(m.sharpness, 0.0);
        assert_eq!(m.contrast, 0.0);
        assert!(m.blurry && m.low_contrast);
        assert_eq!(m.label(), QualityLabel::Blurry);
    }

    #[test]
    fn checkerboard_is_sharp_and_contrasty() {
        let m = measure(&checkerboard(16, 16)).unwrap();
        assert!((m.brightness - 127.5).abs() < 1e-9);
        assert!((m.contrast - 127.5).abs() < 1e-9);
        // 모든 픽셀의 응답이 ±1020
        assert!((m.sharpness - 1020.0 * 1020.0).abs() < 1e-6);
        assert_eq!(m.label(), QualityLabel::Good);
    }

    #[test]
    fn single_pixel_frame_is_measurable() {
        let m = measure(&uniform(1, 1, 77)).unwrap();
        assert_eq!(m.sharpness, 0.0);
        assert!((m.brightness - 77.0).abs() < 1e-9);
    }

    #[test]
    fn reflect101_indices() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
        assert_eq!(reflect101(1, 2), 1);
        assert_eq!(reflect101(2, 2), 0);
    }

    #[test]
    fn analyzer_decodes_jpeg() {
        let frame = VideoFrame::new(encode_jpeg(uniform(64, 64, 2)));
        let m = LumaQualityAnalyzer::new().analyze(&frame).unwrap();
        assert!(m.black_screen);
    }

    #[test]
    fn analyzer_rejects_garbage() {
        let frame = VideoFrame::new(vec![0xFF, 0xD8, 0x00, 0x01, 0x02]);
        let err = LumaQualityAnalyzer::new().analyze(&frame).unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }
}

//! Preprocessing variant catalog for the fallback search.
//!
//! Seven deterministic grayscale transforms tried in a fixed order:
//! untouched pixels first, then light denoising, then contrast
//! enhancement, then hard binarization. Each transform is pure and
//! dimension preserving, so a sweep over the catalog is reproducible.

use image::{GrayImage, Luma};
use imageproc::contrast::{self, ThresholdType};
use imageproc::filter;
use serde::{Deserialize, Serialize};

use crate::clahe;

/// Blur strength for the Gaussian variant (the sigma a 3x3 kernel
/// implies).
const GAUSSIAN_SIGMA: f32 = 0.8;
/// Window radius for the median variant (radius 1 is a 3x3 window).
const MEDIAN_RADIUS: u32 = 1;
/// Contrast gain bound for the CLAHE variant.
const CLAHE_CLIP_LIMIT: f32 = 2.0;
/// CLAHE tile grid dimension (8x8 tiles).
const CLAHE_TILE_GRID: u32 = 8;
/// Local mean smoothing for the adaptive variant (the sigma an
/// 11-pixel block implies).
const ADAPTIVE_SIGMA: f32 = 2.0;
/// Offset subtracted from the local mean in the adaptive variant.
const ADAPTIVE_CONSTANT: f64 = 2.0;

/// Every preprocessing variant, in the order the search tries them.
pub const CATALOG: [PreprocessKind; 7] = [
    PreprocessKind::Original,
    PreprocessKind::GaussianBlur,
    PreprocessKind::MedianBlur,
    PreprocessKind::Clahe,
    PreprocessKind::HistogramEq,
    PreprocessKind::Threshold,
    PreprocessKind::AdaptiveThresh,
];

/// A preprocessing transform applied to the grayscale image before a
/// detection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessKind {
    /// The grayscale image untouched.
    Original,
    /// Gaussian blur to suppress sensor noise.
    GaussianBlur,
    /// 3x3 median filter to remove salt-and-pepper noise.
    MedianBlur,
    /// Tiled contrast limited adaptive histogram equalization.
    Clahe,
    /// Global histogram equalization.
    HistogramEq,
    /// Global Otsu binarization.
    Threshold,
    /// Local-mean binarization.
    AdaptiveThresh,
}

impl PreprocessKind {
    /// Stable snake_case name, used in log lines and artifact file
    /// names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::GaussianBlur => "gaussian_blur",
            Self::MedianBlur => "median_blur",
            Self::Clahe => "clahe",
            Self::HistogramEq => "histogram_eq",
            Self::Threshold => "threshold",
            Self::AdaptiveThresh => "adaptive_thresh",
        }
    }

    /// Apply the transform.
    #[must_use = "returns the transformed image"]
    pub fn apply(self, gray: &GrayImage) -> GrayImage {
        match self {
            Self::Original => gray.clone(),
            Self::GaussianBlur => filter::gaussian_blur_f32(gray, GAUSSIAN_SIGMA),
            Self::MedianBlur => filter::median_filter(gray, MEDIAN_RADIUS, MEDIAN_RADIUS),
            Self::Clahe => clahe::clahe(gray, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID, CLAHE_TILE_GRID),
            Self::HistogramEq => contrast::equalize_histogram(gray),
            Self::Threshold => otsu_binarize(gray),
            Self::AdaptiveThresh => adaptive_binarize(gray),
        }
    }
}

/// Global Otsu binarization: pixels above the Otsu level become white.
fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let level = contrast::otsu_level(gray);
    contrast::threshold(gray, level, ThresholdType::Binary)
}

/// Local-mean binarization: a pixel becomes white when it exceeds the
/// Gaussian-weighted neighborhood mean minus a small offset.
fn adaptive_binarize(gray: &GrayImage) -> GrayImage {
    let local_mean = filter::gaussian_blur_f32(gray, ADAPTIVE_SIGMA);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = f64::from(gray.get_pixel(x, y).0[0]);
        let mean = f64::from(local_mean.get_pixel(x, y).0[0]);
        if value > mean - ADAPTIVE_CONSTANT {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

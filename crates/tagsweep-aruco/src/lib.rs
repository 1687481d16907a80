//! tagsweep-aruco: pure-Rust 5x5 square marker detector.
//!
//! Implements the `tagsweep-pipeline` [`TagDetector`] contract with no
//! native dependencies. Candidate quads come from an inverted
//! local-mean threshold and contour tracing, payloads are sampled
//! through a direct homography and matched against a built-in 250-code
//! dictionary with error correction. A marker renderer is included for
//! building test scenes and printable markers.

mod decode;
pub mod dictionary;
mod homography;
pub mod marker;
mod quad;

pub use dictionary::{CodeMatch, Dictionary};
pub use marker::{RenderError, render_marker};

use image::GrayImage;
use tagsweep_pipeline::{
    Detection, DetectorError, DetectorParams, RejectedCandidate, TagDetector,
};

/// Marker detector over a fixed dictionary.
#[derive(Debug, Clone)]
pub struct ArucoDetector {
    dictionary: &'static Dictionary,
}

impl ArucoDetector {
    /// Detector over the built-in 250-code dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dictionary: Dictionary::builtin(),
        }
    }

    /// The dictionary detections are matched against.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        self.dictionary
    }
}

impl Default for ArucoDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TagDetector for ArucoDetector {
    fn detect(
        &self,
        gray: &GrayImage,
        params: &DetectorParams,
    ) -> Result<Detection, DetectorError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DetectorError::new("cannot scan an empty raster"));
        }

        let candidates = quad::find_candidates(gray, params);
        let mut detection = Detection::default();
        for candidate in &candidates {
            match decode::decode_quad(gray, candidate, self.dictionary, params) {
                Some(tag) => detection.tags.push(tag),
                None => detection.rejected.push(RejectedCandidate {
                    points: candidate.corners.to_vec(),
                }),
            }
        }
        tracing::debug!(
            candidates = candidates.len(),
            decoded = detection.tags.len(),
            "scanned raster"
        );
        Ok(detection)
    }
}

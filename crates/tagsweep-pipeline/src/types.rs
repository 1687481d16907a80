//! Core data types shared across the detection pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::preprocess::PreprocessKind;
use crate::profiles::ProfileKind;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Cheaper than [`Point::distance`] when only comparing magnitudes.
    #[must_use]
    pub fn distance_squared(&self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A single decoded marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTag {
    /// Dictionary id of the marker.
    pub id: u32,
    /// Corner positions, index 0 being the marker's own top-left,
    /// continuing clockwise.
    pub corners: [Point; 4],
}

impl DetectedTag {
    /// Centroid of the four corners.
    ///
    /// Anchors the id label when annotating.
    #[must_use]
    pub fn centroid(&self) -> Point {
        let sum_x: f64 = self.corners.iter().map(|p| p.x).sum();
        let sum_y: f64 = self.corners.iter().map(|p| p.y).sum();
        Point::new(sum_x / 4.0, sum_y / 4.0)
    }
}

/// A candidate polygon that looked like a marker but failed decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    /// Outline of the candidate, in image coordinates.
    pub points: Vec<Point>,
}

/// Output of a single detector invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Markers that decoded successfully.
    pub tags: Vec<DetectedTag>,
    /// Candidates that were extracted but did not decode.
    pub rejected: Vec<RejectedCandidate>,
}

/// Final result of the fallback search across preprocessing variants
/// and parameter profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Whether any attempt decoded at least one marker.
    pub success: bool,
    /// Decoded markers from the winning attempt (empty on failure).
    pub tags: Vec<DetectedTag>,
    /// Preprocessing variant of the winning attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_preprocess: Option<PreprocessKind>,
    /// Parameter profile of the winning attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_profile: Option<ProfileKind>,
    /// Rejected candidates from the reference attempt, kept for
    /// diagnostics when the whole search fails.
    pub rejected: Vec<RejectedCandidate>,
}

impl SearchOutcome {
    /// Build a successful outcome for the attempt that won.
    #[must_use]
    pub fn detected(
        tags: Vec<DetectedTag>,
        preprocess: PreprocessKind,
        profile: ProfileKind,
    ) -> Self {
        Self {
            success: true,
            tags,
            winning_preprocess: Some(preprocess),
            winning_profile: Some(profile),
            rejected: Vec::new(),
        }
    }

    /// Build a failed outcome carrying the reference attempt's
    /// rejected candidates.
    #[must_use]
    pub fn not_detected(rejected: Vec<RejectedCandidate>) -> Self {
        Self {
            success: false,
            tags: Vec::new(),
            winning_preprocess: None,
            winning_profile: None,
            rejected,
        }
    }
}

/// Errors that can occur while running the detection search.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input byte slice was empty.
    #[error("input image bytes are empty")]
    EmptyInput,

    /// The image bytes could not be decoded. Wraps the underlying
    /// `image` crate error (unknown format, corrupt data, etc.).
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded raster has zero width or height.
    #[error("image has zero width or height")]
    EmptyRaster,

    /// A diagnostics sink failed to record an artifact.
    #[error("failed to record diagnostics: {0}")]
    Diagnostics(String),
}

/// Error raised by a tag detector implementation.
///
/// Detectors are pluggable, so the search layer treats their failures
/// as opaque messages instead of enumerating causes. The search logs
/// the message and moves on to the next attempt.
#[derive(Debug, Error)]
#[error("detector failed: {message}")]
pub struct DetectorError {
    message: String,
}

impl DetectorError {
    /// Create a detector error from any printable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_new() {
        let p = Point::new(3.0, 4.0);
        assert!((p.x - 3.0).abs() < f64::EPSILON);
        assert!((p.y - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-10);
        assert!((a.distance_squared(b) - 25.0).abs() < 1e-10);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(7.5, -2.5);
        assert!(p.distance(p).abs() < f64::EPSILON);
    }

    #[test]
    fn point_serde_roundtrip() {
        let p = Point::new(1.5, -2.25);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    // --- DetectedTag tests ---

    #[test]
    fn tag_centroid_of_unit_square() {
        let tag = DetectedTag {
            id: 7,
            corners: [
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
        };
        let c = tag.centroid();
        assert!((c.x - 0.5).abs() < 1e-10);
        assert!((c.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn tag_serde_roundtrip() {
        let tag = DetectedTag {
            id: 42,
            corners: [
                Point::new(10.0, 20.0),
                Point::new(30.0, 20.0),
                Point::new(30.0, 40.0),
                Point::new(10.0, 40.0),
            ],
        };
        let json = serde_json::to_string(&tag).unwrap();
        let back: DetectedTag = serde_json::from_str(&json).unwrap();
        assert_eq!(tag, back);
    }

    // --- SearchOutcome tests ---

    #[test]
    fn detected_outcome_carries_winner() {
        let tags = vec![DetectedTag {
            id: 3,
            corners: [Point::new(0.0, 0.0); 4],
        }];
        let outcome =
            SearchOutcome::detected(tags.clone(), PreprocessKind::Clahe, ProfileKind::Relaxed);
        assert!(outcome.success);
        assert_eq!(outcome.tags, tags);
        assert_eq!(outcome.winning_preprocess, Some(PreprocessKind::Clahe));
        assert_eq!(outcome.winning_profile, Some(ProfileKind::Relaxed));
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn not_detected_outcome_keeps_rejected() {
        let rejected = vec![RejectedCandidate {
            points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        }];
        let outcome = SearchOutcome::not_detected(rejected.clone());
        assert!(!outcome.success);
        assert!(outcome.tags.is_empty());
        assert_eq!(outcome.winning_preprocess, None);
        assert_eq!(outcome.winning_profile, None);
        assert_eq!(outcome.rejected, rejected);
    }

    #[test]
    fn outcome_serde_roundtrip() {
        let outcome = SearchOutcome::detected(
            vec![DetectedTag {
                id: 9,
                corners: [
                    Point::new(1.0, 1.0),
                    Point::new(2.0, 1.0),
                    Point::new(2.0, 2.0),
                    Point::new(1.0, 2.0),
                ],
            }],
            PreprocessKind::AdaptiveThresh,
            ProfileKind::Strict,
        );
        let json = serde_json::to_string(&outcome).unwrap();
        let back: SearchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }

    #[test]
    fn failed_outcome_omits_winner_fields_in_json() {
        let outcome = SearchOutcome::not_detected(Vec::new());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("winning_preprocess"));
        assert!(!json.contains("winning_profile"));
        let back: SearchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }

    // --- error tests ---

    #[test]
    fn pipeline_error_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image bytes are empty"
        );
        assert_eq!(
            PipelineError::EmptyRaster.to_string(),
            "image has zero width or height"
        );
        assert_eq!(
            PipelineError::Diagnostics("disk full".to_owned()).to_string(),
            "failed to record diagnostics: disk full"
        );
    }

    #[test]
    fn detector_error_display() {
        let err = DetectorError::new("raster too small");
        assert_eq!(err.to_string(), "detector failed: raster too small");
    }
}

//! Detector parameter profiles.
//!
//! A profile is a named list of overrides merged onto the detector's
//! baseline parameters. The merge goes through an explicit name-to-field
//! mapping: unknown names and mismatched value shapes are skipped, so a
//! profile may carry knobs that this detector version does not support.

use serde::{Deserialize, Serialize};

/// Tunable parameters for one detection attempt.
///
/// The defaults are the baseline every profile starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Smallest adaptive threshold window in pixels.
    pub adaptive_thresh_win_size_min: u32,
    /// Largest adaptive threshold window in pixels.
    pub adaptive_thresh_win_size_max: u32,
    /// Increment between consecutive window sizes.
    pub adaptive_thresh_win_size_step: u32,
    /// Offset subtracted from the local mean when binarizing.
    pub adaptive_thresh_constant: f64,
    /// Lower bound on candidate perimeter, as a rate of the larger
    /// image dimension.
    pub min_marker_perimeter_rate: f64,
    /// Upper bound on candidate perimeter, as a rate of the larger
    /// image dimension.
    pub max_marker_perimeter_rate: f64,
    /// Polygon approximation tolerance, as a rate of the contour
    /// perimeter.
    pub polygonal_approx_accuracy_rate: f64,
    /// Minimum pairwise corner separation, as a rate of the candidate
    /// perimeter.
    pub min_corner_distance_rate: f64,
    /// Minimum distance in pixels from any corner to the image border.
    pub min_distance_to_border: u32,
    /// Width of the black border ring around the payload, in cells.
    pub marker_border_bits: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            adaptive_thresh_win_size_min: 3,
            adaptive_thresh_win_size_max: 23,
            adaptive_thresh_win_size_step: 10,
            adaptive_thresh_constant: 7.0,
            min_marker_perimeter_rate: 0.03,
            max_marker_perimeter_rate: 4.0,
            polygonal_approx_accuracy_rate: 0.03,
            min_corner_distance_rate: 0.05,
            min_distance_to_border: 3,
            marker_border_bits: 1,
        }
    }
}

impl DetectorParams {
    /// Apply one named override.
    ///
    /// Returns whether the name matched a known field and the value had
    /// the matching shape. Anything else leaves the parameters
    /// untouched.
    pub fn apply_named(&mut self, name: &str, value: ParamValue) -> bool {
        match (name, value) {
            ("adaptive_thresh_win_size_min", ParamValue::Int(v)) => {
                set_u32(&mut self.adaptive_thresh_win_size_min, v)
            }
            ("adaptive_thresh_win_size_max", ParamValue::Int(v)) => {
                set_u32(&mut self.adaptive_thresh_win_size_max, v)
            }
            ("adaptive_thresh_win_size_step", ParamValue::Int(v)) => {
                set_u32(&mut self.adaptive_thresh_win_size_step, v)
            }
            ("adaptive_thresh_constant", ParamValue::Float(v)) => {
                self.adaptive_thresh_constant = v;
                true
            }
            ("min_marker_perimeter_rate", ParamValue::Float(v)) => {
                self.min_marker_perimeter_rate = v;
                true
            }
            ("max_marker_perimeter_rate", ParamValue::Float(v)) => {
                self.max_marker_perimeter_rate = v;
                true
            }
            ("polygonal_approx_accuracy_rate", ParamValue::Float(v)) => {
                self.polygonal_approx_accuracy_rate = v;
                true
            }
            ("min_corner_distance_rate", ParamValue::Float(v)) => {
                self.min_corner_distance_rate = v;
                true
            }
            ("min_distance_to_border", ParamValue::Int(v)) => {
                set_u32(&mut self.min_distance_to_border, v)
            }
            ("marker_border_bits", ParamValue::Int(v)) => {
                set_u32(&mut self.marker_border_bits, v)
            }
            _ => false,
        }
    }
}

/// Store an integer override, rejecting values outside `u32` range.
fn set_u32(field: &mut u32, value: i64) -> bool {
    match u32::try_from(value) {
        Ok(v) => {
            *field = v;
            true
        }
        Err(_) => false,
    }
}

/// A single override value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Override for an integer-typed field.
    Int(i64),
    /// Override for a float-typed field.
    Float(f64),
}

/// Every profile, in the order the search tries them.
pub const CATALOG: [ProfileKind; 3] = [
    ProfileKind::Default,
    ProfileKind::Relaxed,
    ProfileKind::Strict,
];

/// Selects which override list to merge onto the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// The baseline untouched. Tuned for clean, well-lit markers.
    #[default]
    Default,
    /// Recall-leaning: wider threshold sweep, smaller perimeter floor,
    /// looser polygon and corner constraints. For small, distant, or
    /// partially damaged markers, at some false-positive risk.
    Relaxed,
    /// Precision-leaning: narrower threshold sweep, higher threshold
    /// offset, tighter perimeter and polygon constraints. For scenes
    /// with large, clean markers where false positives are costly.
    Strict,
}

/// Overrides for [`ProfileKind::Relaxed`].
const RELAXED_OVERRIDES: &[(&str, ParamValue)] = &[
    ("adaptive_thresh_win_size_min", ParamValue::Int(3)),
    ("adaptive_thresh_win_size_max", ParamValue::Int(23)),
    ("adaptive_thresh_win_size_step", ParamValue::Int(4)),
    ("adaptive_thresh_constant", ParamValue::Float(7.0)),
    ("min_marker_perimeter_rate", ParamValue::Float(0.01)),
    ("max_marker_perimeter_rate", ParamValue::Float(4.0)),
    ("polygonal_approx_accuracy_rate", ParamValue::Float(0.05)),
    ("min_corner_distance_rate", ParamValue::Float(0.01)),
    ("min_distance_to_border", ParamValue::Int(1)),
    ("marker_border_bits", ParamValue::Int(1)),
];

/// Overrides for [`ProfileKind::Strict`].
const STRICT_OVERRIDES: &[(&str, ParamValue)] = &[
    ("adaptive_thresh_win_size_min", ParamValue::Int(5)),
    ("adaptive_thresh_win_size_max", ParamValue::Int(15)),
    ("adaptive_thresh_constant", ParamValue::Float(10.0)),
    ("min_marker_perimeter_rate", ParamValue::Float(0.1)),
    ("max_marker_perimeter_rate", ParamValue::Float(2.0)),
    ("polygonal_approx_accuracy_rate", ParamValue::Float(0.01)),
    ("min_corner_distance_rate", ParamValue::Float(0.1)),
];

impl ProfileKind {
    /// Stable snake_case name, used in log lines and artifact file
    /// names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Relaxed => "relaxed",
            Self::Strict => "strict",
        }
    }

    /// The override list this profile merges onto the baseline.
    #[must_use]
    pub const fn overrides(self) -> &'static [(&'static str, ParamValue)] {
        match self {
            Self::Default => &[],
            Self::Relaxed => RELAXED_OVERRIDES,
            Self::Strict => STRICT_OVERRIDES,
        }
    }

    /// Merge this profile onto the baseline parameters.
    #[must_use]
    pub fn params(self) -> DetectorParams {
        let mut params = DetectorParams::default();
        for &(name, value) in self.overrides() {
            params.apply_named(name, value);
        }
        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- baseline tests ---

    #[test]
    fn baseline_values() {
        let params = DetectorParams::default();
        assert_eq!(params.adaptive_thresh_win_size_min, 3);
        assert_eq!(params.adaptive_thresh_win_size_max, 23);
        assert_eq!(params.adaptive_thresh_win_size_step, 10);
        assert!((params.adaptive_thresh_constant - 7.0).abs() < f64::EPSILON);
        assert!((params.min_marker_perimeter_rate - 0.03).abs() < f64::EPSILON);
        assert!((params.max_marker_perimeter_rate - 4.0).abs() < f64::EPSILON);
        assert!((params.polygonal_approx_accuracy_rate - 0.03).abs() < f64::EPSILON);
        assert!((params.min_corner_distance_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(params.min_distance_to_border, 3);
        assert_eq!(params.marker_border_bits, 1);
    }

    // --- merge tests ---

    #[test]
    fn unknown_name_is_skipped() {
        let mut params = DetectorParams::default();
        let applied = params.apply_named("corner_refinement_method", ParamValue::Int(1));
        assert!(!applied);
        assert_eq!(params, DetectorParams::default());
    }

    #[test]
    fn mismatched_value_shape_is_skipped() {
        let mut params = DetectorParams::default();
        let applied = params.apply_named("adaptive_thresh_constant", ParamValue::Int(9));
        assert!(!applied);
        let applied = params.apply_named("min_distance_to_border", ParamValue::Float(1.0));
        assert!(!applied);
        assert_eq!(params, DetectorParams::default());
    }

    #[test]
    fn out_of_range_int_is_skipped() {
        let mut params = DetectorParams::default();
        let applied = params.apply_named("min_distance_to_border", ParamValue::Int(-1));
        assert!(!applied);
        assert_eq!(params.min_distance_to_border, 3);
    }

    #[test]
    fn known_overrides_apply() {
        let mut params = DetectorParams::default();
        assert!(params.apply_named("adaptive_thresh_win_size_step", ParamValue::Int(4)));
        assert!(params.apply_named("min_marker_perimeter_rate", ParamValue::Float(0.01)));
        assert_eq!(params.adaptive_thresh_win_size_step, 4);
        assert!((params.min_marker_perimeter_rate - 0.01).abs() < f64::EPSILON);
    }

    // --- profile tests ---

    #[test]
    fn catalog_order_is_fixed() {
        let names: Vec<&str> = CATALOG.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["default", "relaxed", "strict"]);
    }

    #[test]
    fn default_profile_is_the_baseline() {
        assert_eq!(ProfileKind::Default.params(), DetectorParams::default());
        assert!(ProfileKind::Default.overrides().is_empty());
    }

    #[test]
    fn relaxed_profile_values() {
        let params = ProfileKind::Relaxed.params();
        assert_eq!(params.adaptive_thresh_win_size_step, 4);
        assert!((params.min_marker_perimeter_rate - 0.01).abs() < f64::EPSILON);
        assert!((params.polygonal_approx_accuracy_rate - 0.05).abs() < f64::EPSILON);
        assert!((params.min_corner_distance_rate - 0.01).abs() < f64::EPSILON);
        assert_eq!(params.min_distance_to_border, 1);
    }

    #[test]
    fn strict_profile_values() {
        let params = ProfileKind::Strict.params();
        assert_eq!(params.adaptive_thresh_win_size_min, 5);
        assert_eq!(params.adaptive_thresh_win_size_max, 15);
        assert!((params.adaptive_thresh_constant - 10.0).abs() < f64::EPSILON);
        assert!((params.min_marker_perimeter_rate - 0.1).abs() < f64::EPSILON);
        assert!((params.max_marker_perimeter_rate - 2.0).abs() < f64::EPSILON);
        // Fields without an override keep their baseline values.
        assert_eq!(params.adaptive_thresh_win_size_step, 10);
        assert_eq!(params.min_distance_to_border, 3);
        assert_eq!(params.marker_border_bits, 1);
    }

    #[test]
    fn every_catalog_override_applies_cleanly() {
        for profile in CATALOG {
            let mut params = DetectorParams::default();
            for &(name, value) in profile.overrides() {
                assert!(
                    params.apply_named(name, value),
                    "{} override {name} did not apply",
                    profile.name(),
                );
            }
        }
    }

    #[test]
    fn profile_kind_default_is_default() {
        assert_eq!(ProfileKind::default(), ProfileKind::Default);
    }

    // --- serde tests ---

    #[test]
    fn profile_serde_names_match_name_method() {
        for kind in CATALOG {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
            let back: ProfileKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn params_serde_roundtrip() {
        let params = ProfileKind::Relaxed.params();
        let json = serde_json::to_string(&params).unwrap();
        let back: DetectorParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}

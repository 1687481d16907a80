//! The detection primitive contract.
//!
//! The fallback search treats marker detection as a pluggable
//! collaborator: anything that can scan a grayscale raster under a
//! parameter set and report decoded tags plus rejected candidate
//! polygons. The workspace implementation lives in `tagsweep-aruco`;
//! search tests substitute scripted stubs.

use image::GrayImage;

use crate::profiles::DetectorParams;
use crate::types::{Detection, DetectorError};

/// Trait for marker detection primitives.
pub trait TagDetector {
    /// Scan `gray` for markers under `params`.
    ///
    /// Corner order within each returned tag is the implementation's
    /// own and is preserved verbatim downstream.
    ///
    /// # Errors
    ///
    /// Implementations report unprocessable input as [`DetectorError`].
    /// The search layer logs the error and treats that attempt as a
    /// non-detection.
    fn detect(
        &self,
        gray: &GrayImage,
        params: &DetectorParams,
    ) -> Result<Detection, DetectorError>;
}

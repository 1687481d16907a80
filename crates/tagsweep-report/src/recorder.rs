//! Artifact persistence for search diagnostics.
//!
//! [`DebugRecorder`] is the filesystem-backed [`DiagnosticsSink`]: it
//! writes every preprocessing variant the search records, plus the
//! annotated overlay for the final outcome. All artifacts land in one
//! debug directory and start with the source image's file stem, so
//! batch runs over distinct files never collide.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use image::{GrayImage, RgbImage};
use tagsweep_pipeline::annotate::{annotate_detections, annotate_rejected};
use tagsweep_pipeline::{
    DetectedTag, DiagnosticsSink, PipelineError, PreprocessKind, ProfileKind, RejectedCandidate,
    SearchOutcome,
};
use thiserror::Error;

/// Well-known font locations probed for annotation text.
const FONT_CANDIDATES: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Error from artifact persistence or outcome export.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure at a specific path.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path the operation failed on.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Image encode failure at a specific path.
    #[error("image error at {path}: {source}")]
    Image {
        /// Path the encode failed on.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: image::ImageError,
    },
    /// Outcome serialization failure.
    #[error("failed to serialize outcome: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes search artifacts into a debug directory.
///
/// The directory is created on first write and reused afterwards.
pub struct DebugRecorder {
    dir: PathBuf,
    base: String,
    font: Option<FontVec>,
}

impl DebugRecorder {
    /// Recorder writing `{base}_*.jpg` files under `dir`.
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            font: None,
        }
    }

    /// Use the first system font that parses for annotation text.
    /// Without one, overlays carry shapes only.
    #[must_use]
    pub fn with_system_font(mut self) -> Self {
        self.font = load_system_font();
        self
    }

    /// Directory artifacts are written into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one preprocessing variant's output and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the directory cannot be created or
    /// the image cannot be encoded.
    pub fn persist_variant(
        &self,
        kind: PreprocessKind,
        processed: &GrayImage,
    ) -> Result<PathBuf, ReportError> {
        let path = self.artifact_path(kind.name());
        self.ensure_dir()?;
        save_gray(&path, processed)?;
        tracing::debug!("variant artifact written to {}", path.display());
        Ok(path)
    }

    /// Write the annotated overlay for a winning attempt and return
    /// its path.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the directory cannot be created or
    /// the image cannot be encoded.
    pub fn persist_success(
        &self,
        scene: &RgbImage,
        tags: &[DetectedTag],
        preprocess: PreprocessKind,
        profile: ProfileKind,
    ) -> Result<PathBuf, ReportError> {
        let annotated = annotate_detections(scene, tags, self.font.as_ref());
        let path = self.artifact_path(&format!(
            "detected_{}_{}",
            preprocess.name(),
            profile.name()
        ));
        self.ensure_dir()?;
        save_rgb(&path, &annotated)?;
        tracing::debug!("detection artifact written to {}", path.display());
        Ok(path)
    }

    /// Write the rejected-candidates overlay, or nothing when the
    /// list is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the directory cannot be created or
    /// the image cannot be encoded.
    pub fn persist_failure(
        &self,
        scene: &RgbImage,
        rejected: &[RejectedCandidate],
    ) -> Result<Option<PathBuf>, ReportError> {
        if rejected.is_empty() {
            return Ok(None);
        }
        let annotated = annotate_rejected(scene, rejected);
        let path = self.artifact_path("rejected_candidates");
        self.ensure_dir()?;
        save_rgb(&path, &annotated)?;
        tracing::debug!("rejection artifact written to {}", path.display());
        Ok(Some(path))
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{suffix}.jpg", self.base))
    }

    fn ensure_dir(&self) -> Result<(), ReportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ReportError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

impl DiagnosticsSink for DebugRecorder {
    fn record_variant(
        &mut self,
        kind: PreprocessKind,
        processed: &GrayImage,
    ) -> Result<(), PipelineError> {
        self.persist_variant(kind, processed)
            .map(|_| ())
            .map_err(|err| PipelineError::Diagnostics(err.to_string()))
    }
}

/// Write a pretty-printed JSON rendering of `outcome` to `path`.
///
/// # Errors
///
/// Returns [`ReportError`] when serialization or the write fails.
pub fn write_outcome_json(path: &Path, outcome: &SearchOutcome) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(outcome)?;
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// First system font that parses, if any.
#[must_use]
pub fn load_system_font() -> Option<FontVec> {
    FONT_CANDIDATES.iter().find_map(|candidate| {
        let bytes = fs::read(candidate).ok()?;
        FontVec::try_from_vec(bytes).ok()
    })
}

fn save_gray(path: &Path, image: &GrayImage) -> Result<(), ReportError> {
    image.save(path).map_err(|source| ReportError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn save_rgb(path: &Path, image: &RgbImage) -> Result<(), ReportError> {
    image.save(path).map_err(|source| ReportError::Image {
        path: path.to_path_buf(),
        source,
    })
}

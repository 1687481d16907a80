//! Diagnostics capture for the fallback search.
//!
//! The search hands every preprocessing variant's output to a
//! [`DiagnosticsSink`] exactly once per run, leaving an audit trail of
//! what the detector actually saw. Persistence lives outside this
//! crate: `tagsweep-report` implements the sink against a debug
//! directory, while [`DiscardSink`] drops everything for callers that
//! do not want artifacts.

use image::GrayImage;

use crate::preprocess::PreprocessKind;
use crate::types::PipelineError;

/// Receives each preprocessing variant's output during a search.
pub trait DiagnosticsSink {
    /// Record the transformed raster for one catalog variant.
    ///
    /// Called exactly once per catalog entry, in catalog order,
    /// before any detection attempt runs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Diagnostics`] when the artifact cannot
    /// be recorded. The search aborts on the first such failure.
    fn record_variant(
        &mut self,
        kind: PreprocessKind,
        processed: &GrayImage,
    ) -> Result<(), PipelineError>;
}

/// A sink that drops every artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl DiagnosticsSink for DiscardSink {
    fn record_variant(
        &mut self,
        _kind: PreprocessKind,
        _processed: &GrayImage,
    ) -> Result<(), PipelineError> {
        Ok(())
    }
}

//! The fallback search over preprocessing variants and parameter
//! profiles.
//!
//! A single detection attempt with default settings often fails under
//! poor lighting, blur, or marker damage. Instead of hand-tuning, the
//! search sweeps a fixed grid: every preprocessing variant crossed with
//! every parameter profile, in a deterministic priority order, stopping
//! at the first attempt that decodes at least one tag. There is no
//! scoring across attempts; the first success wins even if a later
//! combination would have found more tags or tighter corners.

use image::GrayImage;

use crate::detect::TagDetector;
use crate::diagnostics::DiagnosticsSink;
use crate::preprocess;
use crate::profiles;
use crate::types::{Detection, PipelineError, SearchOutcome};

/// Run the fallback search over a grayscale raster.
///
/// Phase 1 applies every preprocessing variant once and records each
/// result through `sink`, so the audit trail is complete no matter
/// where the sweep stops. Phase 2 tries variants in catalog order, and
/// within each variant every parameter profile in catalog order,
/// returning as soon as an attempt yields a non-empty tag list.
///
/// The very first attempt (`original` with the `default` profile) is
/// the reference attempt: when every attempt fails, the returned
/// outcome carries that attempt's rejected candidates so the failure
/// artifact can show what almost matched.
///
/// A detector error is logged and treated as an empty attempt, so one
/// bad (variant, profile) pairing never aborts the sweep.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyRaster`] for a zero-area image and
/// [`PipelineError::Diagnostics`] when the sink refuses an artifact.
pub fn search(
    detector: &dyn TagDetector,
    gray: &GrayImage,
    sink: &mut dyn DiagnosticsSink,
) -> Result<SearchOutcome, PipelineError> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PipelineError::EmptyRaster);
    }

    // Phase 1: compute and record every variant up front.
    let mut variants = Vec::with_capacity(preprocess::CATALOG.len());
    for kind in preprocess::CATALOG {
        let processed = kind.apply(gray);
        sink.record_variant(kind, &processed)?;
        variants.push((kind, processed));
    }

    // Phase 2: sweep the attempt grid in priority order.
    let mut reference_rejected = Vec::new();
    let mut is_reference_attempt = true;
    for (kind, processed) in &variants {
        for profile in profiles::CATALOG {
            let params = profile.params();
            tracing::debug!(
                "attempting detection with preprocess={} profile={}",
                kind.name(),
                profile.name()
            );

            let detection = match detector.detect(processed, &params) {
                Ok(detection) => detection,
                Err(err) => {
                    tracing::warn!(
                        "detector error on preprocess={} profile={}: {}",
                        kind.name(),
                        profile.name(),
                        err
                    );
                    Detection::default()
                }
            };

            if !detection.tags.is_empty() {
                tracing::info!(
                    "{} tag(s) found with preprocess={} profile={}",
                    detection.tags.len(),
                    kind.name(),
                    profile.name()
                );
                return Ok(SearchOutcome::detected(detection.tags, *kind, profile));
            }

            // The first attempt doubles as the reference attempt; its
            // rejected list feeds the failure artifact.
            if is_reference_attempt {
                reference_rejected = detection.rejected;
                is_reference_attempt = false;
            }
        }
    }

    tracing::info!(
        "no tags found after {} attempts",
        preprocess::CATALOG.len() * profiles::CATALOG.len()
    );
    Ok(SearchOutcome::not_detected(reference_rejected))
}

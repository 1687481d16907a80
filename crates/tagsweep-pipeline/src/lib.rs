//! tagsweep-pipeline: fallback marker detection search (sans-IO).
//!
//! Locating fiducial markers under poor lighting, blur, or marker
//! damage rarely succeeds on the first try. The core of this crate is
//! [`search`]: a deterministic sweep over preprocessing variants
//! crossed with detector parameter profiles, stopping at the first
//! combination that decodes at least one tag and leaving an audit
//! trail of every transform tried.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns structured data. Artifact persistence lives in
//! `tagsweep-report`, the detection primitive in `tagsweep-aruco`, and
//! the command surface in the `tagsweep` binary.

pub mod annotate;
pub mod clahe;
pub mod detect;
pub mod diagnostics;
pub mod grayscale;
pub mod preprocess;
pub mod profiles;
pub mod search;
pub mod types;

pub use detect::TagDetector;
pub use diagnostics::{DiagnosticsSink, DiscardSink};
pub use preprocess::PreprocessKind;
pub use profiles::{DetectorParams, ParamValue, ProfileKind};
pub use search::search;
pub use types::{
    DetectedTag, Detection, DetectorError, PipelineError, Point, RejectedCandidate, SearchOutcome,
};

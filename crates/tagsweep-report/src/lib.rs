//! tagsweep-report: artifact persistence and report formatting.
//!
//! The IO side of the tagsweep workspace. [`DebugRecorder`] writes the
//! search's diagnostic artifacts into a debug directory,
//! [`write_outcome_json`] exports the machine-readable outcome, and
//! [`summary`] builds the human-readable reports the CLI prints.

pub mod recorder;
pub mod summary;

pub use recorder::{DebugRecorder, ReportError, load_system_font, write_outcome_json};
pub use summary::{batch_line, batch_summary, detection_report};

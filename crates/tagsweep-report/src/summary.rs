//! Human-readable report formatting.
//!
//! Pure string builders over [`SearchOutcome`] values. Nothing here
//! decides anything; the search already did, this only renders it.

use tagsweep_pipeline::SearchOutcome;

/// Banner width for the single-image report.
const BANNER_WIDTH: usize = 50;

/// Column the batch status markers align to.
const BATCH_NAME_WIDTH: usize = 30;

/// Format the single-image detection report.
///
/// Success lists every tag with its id and corner coordinates plus the
/// winning (preprocess, profile) pair; failure states the rejected
/// candidate count from the reference attempt. Either way the report
/// closes with a `Final result:` banner.
#[must_use]
pub fn detection_report(outcome: &SearchOutcome) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(BANNER_WIDTH));

    if outcome.success {
        lines.push(format!("{} tag(s) detected", outcome.tags.len()));
        for (index, tag) in outcome.tags.iter().enumerate() {
            lines.push(format!("Tag {} (ID: {}):", index + 1, tag.id));
            for (corner_index, corner) in tag.corners.iter().enumerate() {
                lines.push(format!(
                    "  corner {}: ({:.2}, {:.2})",
                    corner_index + 1,
                    corner.x,
                    corner.y,
                ));
            }
        }
        if let (Some(preprocess), Some(profile)) =
            (outcome.winning_preprocess, outcome.winning_profile)
        {
            lines.push(format!(
                "winning combination: {} / {}",
                preprocess.name(),
                profile.name(),
            ));
        }
    } else {
        lines.push("no tags detected".to_owned());
        lines.push(format!(
            "rejected candidates from the reference attempt: {}",
            outcome.rejected.len(),
        ));
    }

    lines.push("=".repeat(BANNER_WIDTH));
    lines.push(format!(
        "Final result: {}",
        if outcome.success { "SUCCESS" } else { "FAILED" },
    ));
    lines.push("=".repeat(BANNER_WIDTH));
    lines.join("\n")
}

/// Format one batch status line.
#[must_use]
pub fn batch_line(name: &str, outcome: &SearchOutcome) -> String {
    match (outcome.winning_preprocess, outcome.winning_profile) {
        (Some(preprocess), Some(profile)) if outcome.success => format!(
            "{name:<BATCH_NAME_WIDTH$} : SUCCESS ({} tag(s) via {}/{})",
            outcome.tags.len(),
            preprocess.name(),
            profile.name(),
        ),
        _ => format!("{name:<BATCH_NAME_WIDTH$} : FAILED"),
    }
}

/// Format the aggregate summary closing a batch run.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn batch_summary(detected: usize, total: usize) -> String {
    if total == 0 {
        return "no images to scan".to_owned();
    }
    let rate = detected as f64 / total as f64 * 100.0;
    format!("detected in {detected}/{total} images\nsuccess rate: {rate:.1}%")
}

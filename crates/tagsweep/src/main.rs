//! tagsweep: locate fiducial markers in still images.
//!
//! A single detection attempt with default settings often fails under
//! poor lighting, blur, or marker damage, so `detect` runs the full
//! fallback sweep from `tagsweep-pipeline`: every preprocessing variant
//! crossed with every parameter profile, first success wins. Every
//! transform tried and the final annotated result land in a debug
//! directory for post-hoc inspection.
//!
//! # Usage
//!
//! ```text
//! tagsweep detect photo.jpg
//! tagsweep batch images --ext jpg,png
//! tagsweep render 7 --out marker_7.png
//! ```
//!
//! `RUST_LOG` controls per-attempt log verbosity.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use image::RgbImage;
use tagsweep_aruco::{ArucoDetector, Dictionary, render_marker};
use tagsweep_pipeline::{SearchOutcome, grayscale, search};
use tagsweep_report::{
    DebugRecorder, ReportError, batch_line, batch_summary, detection_report, write_outcome_json,
};

/// Fiducial marker detection with a preprocessing fallback sweep.
#[derive(Parser)]
#[command(name = "tagsweep", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect markers in a single image and print a report.
    ///
    /// Exits 0 when at least one tag was found, 1 otherwise.
    Detect {
        /// Path to the image, also tried under the images directory
        /// when it does not exist as given.
        image: PathBuf,

        /// Directory unqualified image names are resolved against.
        #[arg(long, default_value = "images")]
        images_dir: PathBuf,

        /// Directory diagnostic artifacts are written into.
        #[arg(long, default_value = "debug_output")]
        debug_dir: PathBuf,

        /// Also write the outcome as pretty-printed JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Scan a directory of images and print an aggregate success rate.
    ///
    /// Always exits 0; only an unreadable directory exits 1.
    Batch {
        /// Directory to scan, non-recursively.
        #[arg(default_value = "images")]
        dir: PathBuf,

        /// Accepted file extensions, case-insensitive.
        #[arg(long, value_delimiter = ',', default_value = "jpg,jpeg,png,bmp")]
        ext: Vec<String>,

        /// Directory diagnostic artifacts are written into.
        #[arg(long, default_value = "debug_output")]
        debug_dir: PathBuf,
    },

    /// Render a dictionary marker to an image file.
    Render {
        /// Dictionary id of the marker.
        id: u32,

        /// Pixels per marker cell.
        #[arg(long, default_value_t = 20)]
        cell: u32,

        /// Quiet zone width in cells.
        #[arg(long, default_value_t = 2)]
        margin: u32,

        /// Output path, defaulting to `marker_{id}.png`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Detect {
            image,
            images_dir,
            debug_dir,
            json,
        } => run_detect(&image, &images_dir, &debug_dir, json.as_deref()),
        Command::Batch {
            dir,
            ext,
            debug_dir,
        } => run_batch(&dir, &ext, &debug_dir),
        Command::Render {
            id,
            cell,
            margin,
            out,
        } => run_render(id, cell, margin, out),
    }
}

fn run_detect(
    image: &Path,
    images_dir: &Path,
    debug_dir: &Path,
    json: Option<&Path>,
) -> ExitCode {
    let path = resolve_image_path(image, images_dir);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut recorder = DebugRecorder::new(debug_dir, file_stem(&path)).with_system_font();
    let (scene, outcome) = match run_search(&bytes, &mut recorder) {
        Ok(result) => result,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    // The outcome is final from here on. Write failures are surfaced
    // and fail the invocation, but the report below always reflects
    // what the search actually found.
    let mut write_failed = false;
    match persist_outcome(&recorder, &scene, &outcome) {
        Ok(Some(artifact)) => println!("annotated result written to {}", artifact.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error writing artifact: {e}");
            write_failed = true;
        }
    }
    if let Some(json_path) = json {
        match write_outcome_json(json_path, &outcome) {
            Ok(()) => println!("outcome written to {}", json_path.display()),
            Err(e) => {
                eprintln!("Error writing {}: {e}", json_path.display());
                write_failed = true;
            }
        }
    }

    println!("{}", detection_report(&outcome));

    if write_failed || !outcome.success {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_batch(dir: &Path, extensions: &[String], debug_dir: &Path) -> ExitCode {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading directory {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_accepted_extension(path, extensions))
        .collect();
    files.sort();

    println!("batch scan: {} file(s) in {}", files.len(), dir.display());
    println!("{}", "=".repeat(60));

    let mut detected = 0;
    for path in &files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("?");
        match scan_one(path, debug_dir) {
            Ok(outcome) => {
                if outcome.success {
                    detected += 1;
                }
                println!("{}", batch_line(name, &outcome));
            }
            Err(msg) => {
                eprintln!("{msg}");
                println!("{}", batch_line(name, &SearchOutcome::not_detected(Vec::new())));
            }
        }
    }

    println!("{}", "=".repeat(60));
    println!("{}", batch_summary(detected, files.len()));
    ExitCode::SUCCESS
}

fn run_render(id: u32, cell: u32, margin: u32, out: Option<PathBuf>) -> ExitCode {
    let marker = match render_marker(Dictionary::builtin(), id, cell, margin) {
        Ok(marker) => marker,
        Err(e) => {
            eprintln!("Error rendering marker: {e}");
            return ExitCode::FAILURE;
        }
    };

    let path = out.unwrap_or_else(|| PathBuf::from(format!("marker_{id}.png")));
    match marker.save(&path) {
        Ok(()) => {
            println!("marker {id} written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

/// Decode the image and run the fallback search, recording every
/// preprocessing variant through `recorder`.
///
/// Returns the color scene (for annotation) alongside the outcome.
fn run_search(
    bytes: &[u8],
    recorder: &mut DebugRecorder,
) -> Result<(RgbImage, SearchOutcome), String> {
    let decoded = grayscale::decode_image(bytes).map_err(|e| e.to_string())?;
    let gray = decoded.to_luma8();
    let outcome = search(&ArucoDetector::new(), &gray, recorder)
        .map_err(|e| format!("search failed: {e}"))?;
    Ok((decoded.to_rgb8(), outcome))
}

/// Write the final artifact for an outcome: the annotated detection on
/// success, the rejected-candidates overlay on failure. Returns the
/// path when a file was written.
fn persist_outcome(
    recorder: &DebugRecorder,
    scene: &RgbImage,
    outcome: &SearchOutcome,
) -> Result<Option<PathBuf>, ReportError> {
    match (outcome.winning_preprocess, outcome.winning_profile) {
        (Some(preprocess), Some(profile)) => recorder
            .persist_success(scene, &outcome.tags, preprocess, profile)
            .map(Some),
        _ => recorder.persist_failure(scene, &outcome.rejected),
    }
}

/// Full pipeline for one batch entry, artifacts included.
fn scan_one(path: &Path, debug_dir: &Path) -> Result<SearchOutcome, String> {
    let bytes =
        fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let mut recorder = DebugRecorder::new(debug_dir, file_stem(path)).with_system_font();
    let (scene, outcome) = run_search(&bytes, &mut recorder)?;
    if let Err(e) = persist_outcome(&recorder, &scene, &outcome) {
        eprintln!("Error writing artifact for {}: {e}", path.display());
    }
    Ok(outcome)
}

/// Use the path as given when it exists, otherwise try the same name
/// under the images directory.
fn resolve_image_path(path: &Path, images_dir: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    let candidate = images_dir.join(path);
    if candidate.exists() {
        candidate
    } else {
        path.to_path_buf()
    }
}

/// File stem used to key every artifact for one source image.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image")
        .to_owned()
}

fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn existing_path_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, b"x").unwrap();
        assert_eq!(resolve_image_path(&file, Path::new("images")), file);
    }

    #[test]
    fn missing_path_falls_back_to_images_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, b"x").unwrap();
        let resolved = resolve_image_path(Path::new("photo.jpg"), dir.path());
        assert_eq!(resolved, file);
    }

    #[test]
    fn unresolvable_path_is_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_image_path(Path::new("nope.jpg"), dir.path());
        assert_eq!(resolved, Path::new("nope.jpg"));
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        let exts = vec!["jpg".to_owned(), "png".to_owned()];
        assert!(has_accepted_extension(Path::new("a.JPG"), &exts));
        assert!(has_accepted_extension(Path::new("b.png"), &exts));
        assert!(!has_accepted_extension(Path::new("c.bmp"), &exts));
        assert!(!has_accepted_extension(Path::new("noext"), &exts));
    }

    #[test]
    fn file_stem_keys_artifacts() {
        assert_eq!(file_stem(Path::new("images/scene.jpg")), "scene");
        assert_eq!(file_stem(Path::new("scene")), "scene");
    }
}

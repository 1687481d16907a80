//! Payload decoding for candidate quads.
//!
//! A candidate is read by mapping the unit square onto its corners,
//! averaging the grayscale raster over each cell of the marker grid,
//! splitting the cell means into black and white classes, checking the
//! border ring, and matching the payload against the dictionary. The
//! matched rotation then reorders the corners so index 0 is the
//! marker's own top-left.

use image::GrayImage;
use tagsweep_pipeline::{DetectedTag, DetectorParams};

use crate::dictionary::{Dictionary, GRID};
use crate::homography::Homography;
use crate::quad::Quad;

/// Samples per cell edge when averaging a cell's intensity.
const CELL_SAMPLES: u32 = 4;
/// Margin skipped on every side of a cell before sampling, as a share
/// of the cell, so neighboring cells do not bleed into the mean.
const CELL_INSET: f64 = 0.15;
/// Highest tolerated share of white cells in the border ring.
const MAX_BAD_BORDER_RATE: f64 = 0.35;

/// Unit square corners in the order quad corners are stored.
const UNIT_SQUARE: [[f64; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Try to decode `quad` as a marker under `params`. `None` means the
/// border ring or the dictionary lookup rejected the payload.
pub(crate) fn decode_quad(
    gray: &GrayImage,
    quad: &Quad,
    dictionary: &Dictionary,
    params: &DetectorParams,
) -> Option<DetectedTag> {
    let border = params.marker_border_bits;
    let cells = GRID + 2 * border;

    let dst = [
        [quad.corners[0].x, quad.corners[0].y],
        [quad.corners[1].x, quad.corners[1].y],
        [quad.corners[2].x, quad.corners[2].y],
        [quad.corners[3].x, quad.corners[3].y],
    ];
    let homography = Homography::from_pairs(&UNIT_SQUARE, &dst)?;

    let means = sample_cell_means(gray, &homography, cells);
    let threshold = otsu_split(&means);
    let black: Vec<bool> = means.iter().map(|&mean| mean < threshold).collect();

    if !border_ring_valid(&black, cells, border) {
        return None;
    }

    let bits = payload_bits(&black, cells, border);
    let matched = dictionary.identify(bits, Dictionary::max_corrections())?;

    // The matched rotation tells which observed corner is the marker's
    // own top-left; clockwise order is preserved under rotation.
    let shift = (4 - usize::from(matched.rotation)) % 4;
    Some(DetectedTag {
        id: matched.id,
        corners: [
            quad.corners[shift],
            quad.corners[(shift + 1) % 4],
            quad.corners[(shift + 2) % 4],
            quad.corners[(shift + 3) % 4],
        ],
    })
}

/// Mean intensity per cell, row major over a `cells` x `cells` grid in
/// marker space mapped through `homography`.
fn sample_cell_means(gray: &GrayImage, homography: &Homography, cells: u32) -> Vec<f64> {
    let span = 1.0 - 2.0 * CELL_INSET;
    let mut means = Vec::with_capacity((cells * cells) as usize);
    for row in 0..cells {
        for col in 0..cells {
            let mut acc = 0.0;
            for sy in 0..CELL_SAMPLES {
                for sx in 0..CELL_SAMPLES {
                    let fx = (f64::from(sx) + 0.5) / f64::from(CELL_SAMPLES);
                    let fy = (f64::from(sy) + 0.5) / f64::from(CELL_SAMPLES);
                    let u = (f64::from(col) + span.mul_add(fx, CELL_INSET)) / f64::from(cells);
                    let v = (f64::from(row) + span.mul_add(fy, CELL_INSET)) / f64::from(cells);
                    let (x, y) = homography.project(u, v);
                    acc += bilinear_sample(gray, x, y);
                }
            }
            means.push(acc / f64::from(CELL_SAMPLES * CELL_SAMPLES));
        }
    }
    means
}

/// Bilinear interpolation with edge clamping.
fn bilinear_sample(gray: &GrayImage, x: f64, y: f64) -> f64 {
    let (width, height) = gray.dimensions();
    let cx = x.clamp(0.0, f64::from(width - 1));
    let cy = y.clamp(0.0, f64::from(height - 1));
    let fx = cx - cx.floor();
    let fy = cy - cy.floor();
    let x0 = cx.floor() as u32;
    let y0 = cy.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let p00 = f64::from(gray.get_pixel(x0, y0).0[0]);
    let p10 = f64::from(gray.get_pixel(x1, y0).0[0]);
    let p01 = f64::from(gray.get_pixel(x0, y1).0[0]);
    let p11 = f64::from(gray.get_pixel(x1, y1).0[0]);
    let top = p00.mul_add(1.0 - fx, p10 * fx);
    let bottom = p01.mul_add(1.0 - fx, p11 * fx);
    top.mul_add(1.0 - fy, bottom * fy)
}

/// Two-class split of a small sample set by maximizing between-class
/// variance, returning a threshold between the classes. Degenerate
/// (single-valued) input yields a threshold equal to that value, which
/// classifies every sample as white.
fn otsu_split(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    let count = sorted.len() as f64;
    let mut best = sorted[sorted.len() / 2];
    let mut best_gain = 0.0;
    let mut lower_sum = 0.0;
    for split in 1..sorted.len() {
        lower_sum += sorted[split - 1];
        let lower_n = split as f64;
        let upper_n = count - lower_n;
        let lower_mean = lower_sum / lower_n;
        let upper_mean = (total - lower_sum) / upper_n;
        let gain = lower_n * upper_n * (lower_mean - upper_mean).powi(2);
        if gain > best_gain {
            best_gain = gain;
            best = f64::midpoint(sorted[split - 1], sorted[split]);
        }
    }
    best
}

/// The border ring must be black aside from at most
/// [`MAX_BAD_BORDER_RATE`] of its cells.
fn border_ring_valid(black: &[bool], cells: u32, border: u32) -> bool {
    let mut bad = 0_u32;
    let mut total = 0_u32;
    for row in 0..cells {
        for col in 0..cells {
            let in_ring = row < border
                || col < border
                || row >= cells - border
                || col >= cells - border;
            if in_ring {
                total += 1;
                if !black[(row * cells + col) as usize] {
                    bad += 1;
                }
            }
        }
    }
    total == 0 || f64::from(bad) <= MAX_BAD_BORDER_RATE * f64::from(total)
}

/// Interior payload cells as a row-major bit pattern, set bit = black.
fn payload_bits(black: &[bool], cells: u32, border: u32) -> u32 {
    let mut bits = 0_u32;
    let mut index = 0_u32;
    for row in 0..GRID {
        for col in 0..GRID {
            let cell = ((row + border) * cells + col + border) as usize;
            if black[cell] {
                bits |= 1 << index;
            }
            index += 1;
        }
    }
    bits
}

//! Candidate quad extraction.
//!
//! Markers present as dark square outlines, so extraction binarizes
//! with an inverted local-mean threshold (dark ink becomes foreground),
//! traces contours, and keeps contours that simplify to convex quads.
//! The threshold window is swept over a range of sizes because the
//! best window depends on marker scale and lighting; quads found at
//! several window sizes are collapsed by a near-duplicate check.

use image::{GrayImage, Luma};
use tagsweep_pipeline::{DetectorParams, Point};

/// Share of the smaller perimeter below which two quads count as the
/// same marker found twice.
const DUPLICATE_RATE: f64 = 0.125;

/// A convex four-corner candidate, corners in clockwise image order.
#[derive(Debug, Clone)]
pub(crate) struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub(crate) fn perimeter(&self) -> f64 {
        (0..4)
            .map(|i| self.corners[i].distance(self.corners[(i + 1) % 4]))
            .sum()
    }

    /// Reverse the winding when the corners run counterclockwise in
    /// image coordinates (y grows downward).
    fn orient_clockwise(&mut self) {
        if self.signed_area() < 0.0 {
            self.corners.swap(1, 3);
        }
    }

    /// Shoelace sum, positive for clockwise image-space winding.
    fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            sum += a.x.mul_add(b.y, -(b.x * a.y));
        }
        sum / 2.0
    }

    /// Cross products of consecutive edges must all share a sign.
    fn is_convex(&self) -> bool {
        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let c = self.corners[(i + 2) % 4];
            let cross = (b.x - a.x).mul_add(c.y - b.y, -((b.y - a.y) * (c.x - b.x)));
            if cross == 0.0 {
                return false;
            }
            if sign == 0.0 {
                sign = cross;
            } else if sign.signum() != cross.signum() {
                return false;
            }
        }
        true
    }

    fn min_corner_spacing(&self) -> f64 {
        let mut best = f64::INFINITY;
        for i in 0..4 {
            for j in (i + 1)..4 {
                best = best.min(self.corners[i].distance(self.corners[j]));
            }
        }
        best
    }

    /// Every corner must sit at least `margin` pixels inside the image.
    fn clears_border(&self, width: u32, height: u32, margin: u32) -> bool {
        let m = f64::from(margin);
        self.corners.iter().all(|c| {
            c.x >= m && c.y >= m && c.x < f64::from(width) - m && c.y < f64::from(height) - m
        })
    }
}

/// Extract candidate quads from `gray` under `params`, sweeping the
/// threshold window from `adaptive_thresh_win_size_min` to `..._max` by
/// `..._step` and suppressing near-duplicates across window sizes.
pub(crate) fn find_candidates(gray: &GrayImage, params: &DetectorParams) -> Vec<Quad> {
    let mut candidates: Vec<Quad> = Vec::new();
    let step = params.adaptive_thresh_win_size_step.max(1);
    let mut win = params.adaptive_thresh_win_size_min;
    while win <= params.adaptive_thresh_win_size_max {
        let binary = binarize_inverted(gray, win, params.adaptive_thresh_constant);
        for quad in quads_in_binary(&binary, params) {
            if !candidates.iter().any(|kept| is_duplicate(kept, &quad)) {
                candidates.push(quad);
            }
        }
        win += step;
    }
    candidates
}

/// Binarize with an inverted local-mean threshold: a pixel becomes
/// foreground when it sits more than `constant` below the mean of the
/// `win`-sized window around it. A summed-area table keeps the window
/// mean O(1) per pixel.
fn binarize_inverted(gray: &GrayImage, win: u32, constant: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    let w = width as usize;
    let h = height as usize;
    let raw = gray.as_raw();

    // Summed-area table with a zero top row and left column.
    let iw = w + 1;
    let mut integral = vec![0_i64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0_i64;
        for x in 0..w {
            row_sum += i64::from(raw[y * w + x]);
            integral[(y + 1) * iw + (x + 1)] = row_sum + integral[y * iw + (x + 1)];
        }
    }

    let radius = (win / 2) as usize;
    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let area = ((x1 - x0) * (y1 - y0)) as i64;
            let sum = integral[y1 * iw + x1] - integral[y0 * iw + x1] - integral[y1 * iw + x0]
                + integral[y0 * iw + x0];
            let mean = sum as f64 / area as f64;
            if f64::from(raw[y * w + x]) < mean - constant {
                out.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }
    out
}

/// Trace contours in one binary map and keep the ones that pass the
/// quad filters.
fn quads_in_binary(binary: &GrayImage, params: &DetectorParams) -> Vec<Quad> {
    let max_dim = f64::from(binary.width().max(binary.height()));
    let min_perimeter = params.min_marker_perimeter_rate * max_dim;
    let max_perimeter = params.max_marker_perimeter_rate * max_dim;

    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(binary);

    let mut quads = Vec::new();
    for contour in contours {
        if contour.points.len() < 4 {
            continue;
        }
        let points: Vec<Point> = contour
            .points
            .into_iter()
            .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
            .collect();

        // A polygon over a subset of the contour points is never
        // longer than the traced contour itself.
        let traced = contour_perimeter(&points);
        if traced < min_perimeter {
            continue;
        }

        let epsilon = params.polygonal_approx_accuracy_rate * traced;
        let Some(mut quad) = approximate_quad(&points, epsilon) else {
            continue;
        };
        quad.orient_clockwise();

        let perimeter = quad.perimeter();
        if perimeter < min_perimeter || perimeter > max_perimeter {
            continue;
        }
        if !quad.is_convex() {
            continue;
        }
        if quad.min_corner_spacing() < params.min_corner_distance_rate * perimeter {
            continue;
        }
        if !quad.clears_border(binary.width(), binary.height(), params.min_distance_to_border) {
            continue;
        }
        quads.push(quad);
    }
    quads
}

/// Closed-curve length, including the edge back to the first point.
fn contour_perimeter(points: &[Point]) -> f64 {
    let mut length: f64 = points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        length += last.distance(first);
    }
    length
}

/// Simplify a closed contour with Ramer-Douglas-Peucker and accept it
/// only when exactly four vertices remain.
///
/// The recursion is anchored on a far-apart vertex pair rather than on
/// the traced start point, so a trace that begins mid-edge does not
/// leave a spurious fifth vertex.
fn approximate_quad(points: &[Point], epsilon: f64) -> Option<Quad> {
    let n = points.len();
    if n < 4 {
        return None;
    }

    let first = farthest_from(points, 0);
    let second = farthest_from(points, first);
    if first == second {
        return None;
    }

    // Rotate the ring to start at the first anchor and close it by
    // repeating that point, turning both arcs into open polylines.
    let mut ring: Vec<Point> = Vec::with_capacity(n + 1);
    ring.extend_from_slice(&points[first..]);
    ring.extend_from_slice(&points[..first]);
    ring.push(points[first]);
    let split = (second + n - first) % n;

    let mut kept = vec![false; ring.len()];
    kept[0] = true;
    kept[split] = true;
    rdp_recurse(&ring, 0, split, epsilon, &mut kept);
    rdp_recurse(&ring, split, n, epsilon, &mut kept);

    let vertices: Vec<Point> = ring[..n]
        .iter()
        .zip(&kept)
        .filter(|&(_, keep)| *keep)
        .map(|(&p, _)| p)
        .collect();
    if vertices.len() != 4 {
        return None;
    }
    Some(Quad {
        corners: [vertices[0], vertices[1], vertices[2], vertices[3]],
    })
}

/// Index of the point farthest from `points[anchor]`.
fn farthest_from(points: &[Point], anchor: usize) -> usize {
    let origin = points[anchor];
    let mut best = anchor;
    let mut best_dist = 0.0;
    for (i, p) in points.iter().enumerate() {
        let d = origin.distance_squared(*p);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Recursive Ramer-Douglas-Peucker step: keep the point farthest from
/// the chord when it deviates more than `tolerance`, then recurse into
/// both halves.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`,
/// falling back to point distance when the endpoints coincide.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

/// Two quads are duplicates when some cyclic corner alignment puts
/// every corner pair closer than [`DUPLICATE_RATE`] of the smaller
/// perimeter. Both quads are already clockwise, so only shifts need
/// trying.
fn is_duplicate(a: &Quad, b: &Quad) -> bool {
    let limit = DUPLICATE_RATE * a.perimeter().min(b.perimeter());
    let limit_sq = limit * limit;
    (0..4).any(|shift| {
        (0..4).all(|i| a.corners[i].distance_squared(b.corners[(i + shift) % 4]) < limit_sq)
    })
}

//! Plane projective transform from four point correspondences.
//!
//! Four correspondences give eight incidence equations; fixing the
//! last matrix entry at 1 turns them into an 8x8 linear system solved
//! by Gaussian elimination. No general matrix library is needed for a
//! fixed-size direct solve.

use std::cmp::Ordering;

/// A 3x3 projective transform, stored row major.
#[derive(Debug, Clone)]
pub(crate) struct Homography {
    h: [f64; 9],
}

impl Homography {
    /// Transform mapping each `src[i]` onto `dst[i]`. Returns `None`
    /// when the correspondences are degenerate (three collinear
    /// points on either side).
    pub(crate) fn from_pairs(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Self> {
        let mut system = [[0.0_f64; 9]; 8];
        for i in 0..4 {
            let [sx, sy] = src[i];
            let [dx, dy] = dst[i];
            system[i * 2] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -sx * dx, -sy * dx, dx];
            system[i * 2 + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -sx * dy, -sy * dy, dy];
        }
        let solution = solve(&mut system)?;

        let mut h = [0.0; 9];
        h[..8].copy_from_slice(&solution);
        h[8] = 1.0;
        Some(Self { h })
    }

    /// Map `(x, y)` through the transform.
    pub(crate) fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let w = self.h[6].mul_add(x, self.h[7].mul_add(y, self.h[8]));
        let px = self.h[0].mul_add(x, self.h[1].mul_add(y, self.h[2])) / w;
        let py = self.h[3].mul_add(x, self.h[4].mul_add(y, self.h[5])) / w;
        (px, py)
    }
}

/// Gaussian elimination with partial pivoting over an augmented 8x9
/// system. Returns `None` when the system is singular.
fn solve(system: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8).max_by(|&a, &b| {
            system[a][col]
                .abs()
                .partial_cmp(&system[b][col].abs())
                .unwrap_or(Ordering::Equal)
        })?;
        if system[pivot][col].abs() < 1e-12 {
            return None;
        }
        system.swap(col, pivot);
        for row in (col + 1)..8 {
            let factor = system[row][col] / system[col][col];
            for k in col..9 {
                system[row][k] -= factor * system[col][k];
            }
        }
    }

    let mut x = [0.0_f64; 8];
    for col in (0..8).rev() {
        let mut acc = system[col][8];
        for k in (col + 1)..8 {
            acc -= system[col][k] * x[k];
        }
        x[col] = acc / system[col][col];
    }
    Some(x)
}

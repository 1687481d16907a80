//! Marker rendering.
//!
//! Produces the canonical upright image of a dictionary code: the 5x5
//! payload inside a one-cell black border ring, wrapped in a white
//! quiet zone. Used by tests to build known scenes and exposed to the
//! CLI so users can print their own markers.

use image::{GrayImage, Luma};
use thiserror::Error;

use crate::dictionary::{Dictionary, GRID};

/// Width of the black ring around the payload, in cells.
const BORDER_CELLS: u32 = 1;

/// Error raised when a marker cannot be rendered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The requested id is not in the dictionary.
    #[error("marker id {id} is out of range, the dictionary holds {size} codes")]
    IdOutOfRange {
        /// The id that was asked for.
        id: u32,
        /// Number of codes the dictionary holds.
        size: usize,
    },
    /// Cells one pixel wide or larger are required.
    #[error("cell size must be at least one pixel")]
    EmptyCell,
}

/// Draw marker `id` at `cell_px` pixels per cell with `margin_cells`
/// of white quiet zone on every side.
///
/// # Errors
///
/// Returns [`RenderError::IdOutOfRange`] when the dictionary has no
/// code for `id` and [`RenderError::EmptyCell`] when `cell_px` is 0.
pub fn render_marker(
    dictionary: &Dictionary,
    id: u32,
    cell_px: u32,
    margin_cells: u32,
) -> Result<GrayImage, RenderError> {
    if cell_px == 0 {
        return Err(RenderError::EmptyCell);
    }
    let code = dictionary.code(id).ok_or(RenderError::IdOutOfRange {
        id,
        size: dictionary.len(),
    })?;

    let marker_cells = GRID + 2 * BORDER_CELLS;
    let total_cells = marker_cells + 2 * margin_cells;
    let size = total_cells * cell_px;

    Ok(GrayImage::from_fn(size, size, |x, y| {
        let cx = x / cell_px;
        let cy = y / cell_px;
        let in_marker = cx >= margin_cells
            && cx < margin_cells + marker_cells
            && cy >= margin_cells
            && cy < margin_cells + marker_cells;
        if !in_marker {
            return Luma([255]);
        }
        let mx = cx - margin_cells;
        let my = cy - margin_cells;
        let in_ring = mx < BORDER_CELLS
            || my < BORDER_CELLS
            || mx >= marker_cells - BORDER_CELLS
            || my >= marker_cells - BORDER_CELLS;
        if in_ring {
            return Luma([0]);
        }
        let col = mx - BORDER_CELLS;
        let row = my - BORDER_CELLS;
        if code & (1 << (row * GRID + col)) != 0 {
            Luma([0])
        } else {
            Luma([255])
        }
    }))
}

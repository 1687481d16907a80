//! Annotated overlays for diagnostic artifacts.
//!
//! Pure image-to-image drawing: success overlays show each decoded
//! tag's outline, corner markers, and id label over the original
//! scene; failure overlays show the rejected candidate polygons.
//! Writing the results to disk is `tagsweep-report`'s job, as is
//! loading a font. Without a font the shapes are still drawn and the
//! labels are skipped.

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};

use crate::types::{DetectedTag, Point, RejectedCandidate};

/// Outline and corner color for decoded tags.
const TAG_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Color for corner index labels.
const CORNER_LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
/// Color for the id label at the tag centroid.
const ID_LABEL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Outline color for rejected candidates.
const REJECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Polygon outline thickness in pixels.
const OUTLINE_THICKNESS: i32 = 2;
/// Radius of the filled disc drawn on each corner.
const CORNER_RADIUS: i32 = 5;
/// Offset of a corner index label from its corner.
const CORNER_LABEL_OFFSET: i32 = 10;
/// Pixel height of corner index labels.
const CORNER_LABEL_SCALE: f32 = 14.0;
/// Pixel height of the id label.
const ID_LABEL_SCALE: f32 = 20.0;

/// Draw decoded tags over the original scene.
///
/// Each tag gets its outline, a filled disc plus index label per
/// corner, and an `ID:{id}` label at the centroid.
#[must_use]
pub fn annotate_detections(
    image: &RgbImage,
    tags: &[DetectedTag],
    font: Option<&FontVec>,
) -> RgbImage {
    let mut output = image.clone();
    for tag in tags {
        draw_polygon_outline(&mut output, &tag.corners, TAG_COLOR);

        for (index, corner) in tag.corners.iter().enumerate() {
            draw_filled_circle_mut(
                &mut output,
                (corner.x as i32, corner.y as i32),
                CORNER_RADIUS,
                TAG_COLOR,
            );
            if let Some(font) = font {
                draw_text_mut(
                    &mut output,
                    CORNER_LABEL_COLOR,
                    corner.x as i32 + CORNER_LABEL_OFFSET,
                    corner.y as i32 + CORNER_LABEL_OFFSET,
                    CORNER_LABEL_SCALE,
                    font,
                    &index.to_string(),
                );
            }
        }

        if let Some(font) = font {
            let centroid = tag.centroid();
            draw_text_mut(
                &mut output,
                ID_LABEL_COLOR,
                centroid.x as i32,
                centroid.y as i32,
                ID_LABEL_SCALE,
                font,
                &format!("ID:{}", tag.id),
            );
        }
    }
    output
}

/// Draw rejected candidate polygons over the original scene.
#[must_use]
pub fn annotate_rejected(image: &RgbImage, rejected: &[RejectedCandidate]) -> RgbImage {
    let mut output = image.clone();
    for candidate in rejected {
        draw_polygon_outline(&mut output, &candidate.points, REJECTED_COLOR);
    }
    output
}

/// Draw a closed polygon outline with a small thickness.
fn draw_polygon_outline(img: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        for t in 0..OUTLINE_THICKNESS {
            let offset = t as f32;
            draw_line_segment_mut(
                img,
                (a.x as f32 + offset, a.y as f32),
                (b.x as f32 + offset, b.y as f32),
                color,
            );
            draw_line_segment_mut(
                img,
                (a.x as f32, a.y as f32 + offset),
                (b.x as f32, b.y as f32 + offset),
                color,
            );
        }
    }
}

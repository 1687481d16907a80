//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP) and produces either the
//! decoded color image or a single-channel grayscale image. Detection
//! runs on grayscale; the decoded color image is kept around so
//! annotations can be drawn over the original scene.

use image::{DynamicImage, GrayImage};

use crate::types::PipelineError;

/// Decode raw image bytes into a color image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded image"]
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Decode raw image bytes and convert to grayscale.
///
/// The standard luminance formula is used for RGB-to-gray conversion:
/// `0.299*R + 0.587*G + 0.114*B`.
///
/// # Errors
///
/// Same failure modes as [`decode_image`].
#[must_use = "returns the decoded grayscale image"]
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    let img = decode_image(bytes)?;
    Ok(img.to_luma8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode a uniform RGBA image as a PNG byte buffer.
    fn encode_rgba_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |_, _| {
            image::Rgba([rgb[0], rgb[1], rgb[2], 255])
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .ok();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode_image(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_image(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes_to_grayscale() {
        let buf = encode_rgba_png(2, 2, [255, 255, 255]);
        let gray = decode_and_grayscale(&buf).unwrap();
        for pixel in gray.pixels() {
            assert_eq!(pixel.0[0], 255);
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let buf = encode_rgba_png(17, 31, [128, 64, 32]);
        let gray = decode_and_grayscale(&buf).unwrap();
        assert_eq!(gray.width(), 17);
        assert_eq!(gray.height(), 31);
    }

    #[test]
    fn grayscale_conversion_uses_weighted_luminance() {
        // Different RGB channels must map to different gray values,
        // confirming a weighted conversion rather than a plain average.
        let r_val = decode_and_grayscale(&encode_rgba_png(1, 1, [255, 0, 0]))
            .unwrap()
            .get_pixel(0, 0)
            .0[0];
        let g_val = decode_and_grayscale(&encode_rgba_png(1, 1, [0, 255, 0]))
            .unwrap()
            .get_pixel(0, 0)
            .0[0];
        let b_val = decode_and_grayscale(&encode_rgba_png(1, 1, [0, 0, 255]))
            .unwrap()
            .get_pixel(0, 0)
            .0[0];
        assert!(
            g_val > r_val && r_val > b_val,
            "expected green > red > blue luminance, got R={r_val} G={g_val} B={b_val}",
        );
    }
}

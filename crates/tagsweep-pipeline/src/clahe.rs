//! Contrast limited adaptive histogram equalization.
//!
//! `imageproc` only offers global equalization, so the tiled variant is
//! implemented here: per-tile clipped histograms with excess
//! redistribution, then bilinear interpolation between neighboring tile
//! mappings so tile boundaries leave no visible seams.

use image::{GrayImage, Luma};

/// Apply CLAHE to a grayscale image.
///
/// The image is split into a `tiles_x` by `tiles_y` grid. Each tile gets
/// an equalization lookup table whose contrast gain is bounded by
/// `clip_limit`: histogram counts above `clip_limit * tile_pixels / 256`
/// are clipped and the excess is spread evenly over all bins. Every
/// output pixel interpolates between the four nearest tile tables.
///
/// Images too small for the requested grid are returned unchanged.
#[must_use]
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles_x: u32, tiles_y: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || tiles_x == 0 || tiles_y == 0 {
        return gray.clone();
    }
    let tile_w = width / tiles_x;
    let tile_h = height / tiles_y;
    if tile_w == 0 || tile_h == 0 {
        return gray.clone();
    }

    let raw = gray.as_raw();

    // One mapping LUT per tile. The last row/column of tiles absorbs
    // the remainder when the image does not divide evenly.
    let mut maps = vec![[0_u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles_x - 1 { width } else { x0 + tile_w };
            let y1 = if ty == tiles_y - 1 { height } else { y0 + tile_h };
            let tile_pixels = (x1 - x0) * (y1 - y0);

            let mut hist = [0_u32; 256];
            for row in y0..y1 {
                for col in x0..x1 {
                    hist[raw[(row * width + col) as usize] as usize] += 1;
                }
            }

            // Clip the histogram and redistribute the excess.
            let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);
            let mut excess = 0_u32;
            for bin in &mut hist {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let per_bin = excess / 256;
            let remainder = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += per_bin;
                if i < remainder {
                    *bin += 1;
                }
            }

            // Turn the CDF into a mapping table.
            let mut cdf = [0_u32; 256];
            cdf[0] = hist[0];
            for i in 1..256 {
                cdf[i] = cdf[i - 1] + hist[i];
            }
            let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
            let denom = cdf[255].saturating_sub(cdf_min);

            let map = &mut maps[(ty * tiles_x + tx) as usize];
            for (i, entry) in map.iter_mut().enumerate() {
                if denom == 0 {
                    *entry = i as u8;
                } else {
                    let scaled =
                        (cdf[i].saturating_sub(cdf_min) as f32 / denom as f32) * 255.0;
                    *entry = (scaled as u32).min(255) as u8;
                }
            }
        }
    }

    // Blend the four nearest tile mappings per pixel.
    let tw_f = tile_w as f32;
    let th_f = tile_h as f32;
    GrayImage::from_fn(width, height, |x, y| {
        let value = raw[(y * width + x) as usize] as usize;

        let fx = (x as f32 + 0.5) / tw_f - 0.5;
        let fy = (y as f32 + 0.5) / th_f - 0.5;

        let clamp_tile = |t: i32, count: u32| t.max(0).min(count as i32 - 1) as u32;
        let tx0 = clamp_tile(fx.floor() as i32, tiles_x);
        let tx1 = clamp_tile(fx.floor() as i32 + 1, tiles_x);
        let ty0 = clamp_tile(fy.floor() as i32, tiles_y);
        let ty1 = clamp_tile(fy.floor() as i32 + 1, tiles_y);

        let ax = fx - fx.floor();
        let ay = fy - fy.floor();

        let v00 = maps[(ty0 * tiles_x + tx0) as usize][value] as f32;
        let v10 = maps[(ty0 * tiles_x + tx1) as usize][value] as f32;
        let v01 = maps[(ty1 * tiles_x + tx0) as usize][value] as f32;
        let v11 = maps[(ty1 * tiles_x + tx1) as usize][value] as f32;

        let top = v10.mul_add(ax, v00 * (1.0 - ax));
        let bottom = v11.mul_add(ax, v01 * (1.0 - ax));
        let blended = bottom.mul_add(ay, top * (1.0 - ay));

        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_dimensions() {
        let gray = GrayImage::from_fn(80, 60, |x, y| Luma([((x + y) % 256) as u8]));
        let result = clahe(&gray, 2.0, 8, 8);
        assert_eq!(result.dimensions(), (80, 60));
    }

    #[test]
    fn uniform_image_stays_uniform() {
        // All tiles build identical mappings, so interpolation between
        // them cannot introduce variation.
        let gray = GrayImage::from_pixel(64, 64, Luma([128]));
        let result = clahe(&gray, 2.0, 8, 8);
        let first = result.get_pixel(0, 0).0[0];
        assert!(result.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn image_smaller_than_grid_is_returned_unchanged() {
        let gray = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 40 + y) as u8]));
        let result = clahe(&gray, 2.0, 8, 8);
        assert_eq!(result, gray);
    }

    #[test]
    fn expands_low_contrast_range() {
        // A dim gradient occupying a narrow band should spread out.
        let gray = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x % 20) as u8]));
        let result = clahe(&gray, 2.0, 8, 8);

        let (in_min, in_max) = min_max(&gray);
        let (out_min, out_max) = min_max(&result);
        assert!(
            out_max - out_min > in_max - in_min,
            "expected wider range, got {}..{} from {}..{}",
            out_min,
            out_max,
            in_min,
            in_max,
        );
    }

    fn min_max(img: &GrayImage) -> (u8, u8) {
        let mut lo = u8::MAX;
        let mut hi = u8::MIN;
        for p in img.pixels() {
            lo = lo.min(p.0[0]);
            hi = hi.max(p.0[0]);
        }
        (lo, hi)
    }
}

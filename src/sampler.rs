//! Reduce a full-resolution image to a bounded working set before clustering.

use image::{Rgba, RgbaImage, imageops::FilterType};
use rand::Rng;

use crate::color::is_opaque;

/// Side length of the square sampling cells needed so that at most
/// `max_samples` cells cover a `width`×`height` image.
pub fn grid_size(width: u32, height: u32, max_samples: usize) -> u32 {
    let area = width as f64 * height as f64;
    let cell = (area / max_samples.max(1) as f64).sqrt().ceil();
    (cell as u32).max(1)
}

/// Number of (possibly partial) cells in the sampling grid.
pub fn cell_count(width: u32, height: u32, grid: u32) -> usize {
    width.div_ceil(grid) as usize * height.div_ceil(grid) as usize
}

/// Stratified spatial sampling.
///
/// The image is split into square cells of [`grid_size`] pixels (the last row
/// and column may be partial). One opaque pixel is drawn uniformly at random
/// from every cell; cells without opaque pixels contribute nothing. The result
/// is never longer than the number of cells and is empty only when the image
/// has no opaque pixels.
pub fn stratified_sample<R: Rng + ?Sized>(
    img: &RgbaImage,
    max_samples: usize,
    rng: &mut R,
) -> Vec<Rgba<u8>> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let grid = grid_size(width, height, max_samples);
    let mut samples = Vec::with_capacity(cell_count(width, height, grid));
    let mut cell: Vec<Rgba<u8>> = Vec::with_capacity((grid * grid) as usize);

    for y0 in (0..height).step_by(grid as usize) {
        let y1 = (y0 + grid).min(height);
        for x0 in (0..width).step_by(grid as usize) {
            let x1 = (x0 + grid).min(width);

            cell.clear();
            for y in y0..y1 {
                for x in x0..x1 {
                    let px = *img.get_pixel(x, y);
                    if is_opaque(px[3]) {
                        cell.push(px);
                    }
                }
            }

            if !cell.is_empty() {
                samples.push(cell[rng.random_range(0..cell.len())]);
            }
        }
    }

    samples
}

/// Downscale so the longest side is at most `max_side` pixels, keeping the
/// aspect ratio. Images already within the cap are returned as-is.
pub fn working_copy(img: &RgbaImage, max_side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if longest <= max_side || longest == 0 {
        return img.clone();
    }

    let ratio = max_side as f32 / longest as f32;
    let tw = ((w as f32) * ratio).round().max(1.0) as u32;
    let th = ((h as f32) * ratio).round().max(1.0) as u32;
    image::imageops::resize(img, tw, th, FilterType::Nearest)
}

//! Full-resolution recoloring against a finished palette.

use image::RgbaImage;
use palette::{Lab, Srgb};

use crate::color::{is_opaque, rgb_to_lab};
use crate::kmeans::nearest;

/// Recolor every opaque pixel of `img` with the closest palette color, measured
/// in L*a*b*. The palette's own RGB values are written back, so no color is
/// rounded twice. Alpha and transparent pixels are left untouched.
pub fn quantize_in_place(img: &mut RgbaImage, palette: &[Srgb<u8>]) {
    if palette.is_empty() {
        return;
    }

    let labs: Vec<Lab> = palette.iter().map(|&c| rgb_to_lab(c)).collect();
    for px in img.pixels_mut() {
        if !is_opaque(px[3]) {
            continue;
        }
        let lab = rgb_to_lab(Srgb::new(px[0], px[1], px[2]));
        let c = palette[nearest(&lab, &labs).0];
        px[0] = c.red;
        px[1] = c.green;
        px[2] = c.blue;
    }
}

/// Like [`quantize_in_place`] but leaves the source image intact.
pub fn quantize(img: &RgbaImage, palette: &[Srgb<u8>]) -> RgbaImage {
    let mut out = img.clone();
    quantize_in_place(&mut out, palette);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_recolors_to_nearest() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([240, 20, 10, 255]));
        img.put_pixel(1, 0, Rgba([15, 30, 220, 128]));

        let palette = [Srgb::new(0, 0, 255), Srgb::new(255, 0, 0)];
        let out = quantize(&img, &palette);

        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 255, 128]);
        // source untouched
        assert_eq!(img.get_pixel(0, 0).0, [240, 20, 10, 255]);
    }

    #[test]
    fn test_transparent_pixels_untouched() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([77, 66, 55, 9]));
        img.put_pixel(1, 1, Rgba([77, 66, 55, 10]));
        let out = quantize(&img, &[Srgb::new(1, 2, 3)]);

        for (x, y, px) in out.enumerate_pixels() {
            if (x, y) == (1, 1) {
                assert_eq!(px.0, [1, 2, 3, 10]);
            } else {
                assert_eq!(px.0, [77, 66, 55, 9]);
            }
        }
    }

    #[test]
    fn test_empty_palette_is_noop() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([5, 6, 7, 255]));
        assert_eq!(quantize(&img, &[]), img);
    }

    #[test]
    fn test_perceptual_distance() {
        // Closer to dark gray in RGB, but closer to navy in L*a*b*
        let img = RgbaImage::from_pixel(1, 1, Rgba([20, 20, 90, 255]));
        let palette = [Srgb::new(60, 60, 60), Srgb::new(0, 0, 160)];
        let out = quantize(&img, &palette);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 160, 255]);
    }
}

//! Whole-image hue rotation.

use image::RgbaImage;
use palette::{ShiftHue, Srgb};

use crate::color::{hsl_to_rgb, rgb_to_hsl};
use crate::error::{Result, ThemeError};

/// Rotate the hue of every pixel by `degrees`, keeping saturation, lightness,
/// and alpha. Any finite angle is accepted and wraps around the color wheel.
pub fn shift_hue_in_place(img: &mut RgbaImage, degrees: f32) -> Result<()> {
    if !degrees.is_finite() {
        return Err(ThemeError::InvalidHue(degrees));
    }
    // Full turns leave every pixel where it was
    if degrees.rem_euclid(360.0) == 0.0 {
        return Ok(());
    }

    for px in img.pixels_mut() {
        let hsl = rgb_to_hsl(Srgb::new(px[0], px[1], px[2])).shift_hue(degrees);
        let out = hsl_to_rgb(hsl);
        px[0] = out.red;
        px[1] = out.green;
        px[2] = out.blue;
    }
    Ok(())
}

/// Copying variant of [`shift_hue_in_place`].
pub fn shift_hue(img: &RgbaImage, degrees: f32) -> Result<RgbaImage> {
    let mut out = img.clone();
    shift_hue_in_place(&mut out, degrees)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(&b).all(|(x, y)| x.abs_diff(*y) <= 1)
    }

    fn swatch() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |x, y| match (x, y) {
            (0, 0) => Rgba([255, 0, 0, 255]),
            (1, 0) => Rgba([0, 255, 0, 128]),
            (2, 0) => Rgba([0, 0, 255, 0]),
            (0, 1) => Rgba([120, 120, 120, 255]),
            (1, 1) => Rgba([200, 150, 40, 77]),
            _ => Rgba([12, 90, 180, 255]),
        })
    }

    #[test]
    fn test_zero_is_identity() {
        let img = swatch();
        assert_eq!(shift_hue(&img, 0.0).unwrap(), img);
    }

    #[test]
    fn test_full_turn_wraps_around() {
        let img = swatch();
        assert_eq!(shift_hue(&img, 360.0).unwrap(), img);
        assert_eq!(shift_hue(&img, -720.0).unwrap(), img);

        let a = shift_hue(&img, 480.0).unwrap();
        let b = shift_hue(&img, 120.0).unwrap();
        assert!(a.pixels().zip(b.pixels()).all(|(x, y)| close(x.0, y.0)));
    }

    #[test]
    fn test_third_turn_rotates_primaries() {
        let out = shift_hue(&swatch(), 120.0).unwrap();
        assert!(close(out.get_pixel(0, 0).0, [0, 255, 0, 255]));
        assert!(close(out.get_pixel(1, 0).0, [0, 0, 255, 128]));
        assert!(close(out.get_pixel(2, 0).0, [255, 0, 0, 0]));

        let back = shift_hue(&swatch(), -120.0).unwrap();
        assert!(close(back.get_pixel(0, 0).0, [0, 0, 255, 255]));
    }

    #[test]
    fn test_gray_and_alpha_untouched() {
        let img = swatch();
        let out = shift_hue(&img, 75.0).unwrap();
        assert!(close(out.get_pixel(0, 1).0, [120, 120, 120, 255]));
        for (a, b) in out.pixels().zip(img.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut img = swatch();
        let err = shift_hue_in_place(&mut img, f32::NAN).unwrap_err();
        assert!(matches!(err, ThemeError::InvalidHue(_)));
        assert!(err.is_validation());
        assert_eq!(img, swatch());
        assert!(shift_hue(&img, f32::INFINITY).is_err());
    }
}

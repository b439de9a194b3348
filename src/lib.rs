//! Image color-theme extraction.
//!
//! An RGBA image is reduced to a small palette ordered by dominance:
//!
//! 1. Downscale to a working copy and draw one opaque pixel per grid cell
//!    (stratified sampling).
//! 2. Cluster the samples with k-means++ seeded k-means in L*a*b*.
//! 3. Rank the centroids by population.
//! 4. Recolor every opaque pixel of the full-resolution source with its
//!    nearest palette color.
//!
//! The same engine backs the wasm bindings in [`wasm`] and the native
//! `theme-extract` binary.

pub mod color;
pub mod contrast;
pub mod error;
pub mod hue;
pub mod kmeans;
pub mod pipeline;
pub mod quantize;
pub mod rank;
pub mod sampler;
pub mod wasm;

pub use error::{Result, ThemeError};
pub use hue::shift_hue;
pub use pipeline::{Extraction, Extractor, Job, Options, Poll, Stage, Step, run, run_with_progress};
pub use rank::PaletteEntry;

use image::{ImageFormat, RgbaImage};
use palette::Srgb;

/// Decode an encoded image (PNG, JPEG, ...) into RGBA.
pub fn decode_rgba(input: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(input)?.to_rgba8())
}

/// Encode an RGBA image as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Parse a user-curated palette of hex strings.
pub fn parse_palette<S: AsRef<str>>(hex: &[S]) -> Result<Vec<Srgb<u8>>> {
    if hex.is_empty() {
        return Err(ThemeError::EmptyPalette);
    }
    hex.iter().map(|s| color::parse_hex(s.as_ref())).collect()
}

/// Recolor an already decoded image against a fixed palette, skipping
/// clustering entirely.
pub fn remap_palette<S: AsRef<str>>(img: &RgbaImage, hex: &[S]) -> Result<RgbaImage> {
    let colors = parse_palette(hex)?;
    Ok(quantize::quantize(img, &colors))
}

/// Decode `input`, extract a palette, and return the recolored image as PNG
/// together with the ranked palette. A fixed `seed` makes the run repeatable.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_theme_bytes(
    input: &[u8],
    options: &Options,
    seed: Option<u64>,
) -> Result<(Vec<u8>, Vec<PaletteEntry>)> {
    use rand::{SeedableRng, rngs::StdRng};

    options.validate()?;
    let img = decode_rgba(input)?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let extraction = run(img, *options, rng)?;
    let png = encode_png(&extraction.image)?;
    Ok((png, extraction.palette))
}

/// Decode `input`, recolor it against `hex`, and return the result as PNG.
#[cfg(not(target_arch = "wasm32"))]
pub fn remap_palette_bytes<S: AsRef<str>>(input: &[u8], hex: &[S]) -> Result<Vec<u8>> {
    let colors = parse_palette(hex)?;
    let mut img = decode_rgba(input)?;
    quantize::quantize_in_place(&mut img, &colors);
    encode_png(&img)
}

/// Decode `input`, rotate its hue by `degrees`, and return the result as PNG.
#[cfg(not(target_arch = "wasm32"))]
pub fn shift_hue_bytes(input: &[u8], degrees: f32) -> Result<Vec<u8>> {
    if !degrees.is_finite() {
        return Err(ThemeError::InvalidHue(degrees));
    }
    let mut img = decode_rgba(input)?;
    hue::shift_hue_in_place(&mut img, degrees)?;
    encode_png(&img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_parse_palette() {
        let colors = parse_palette(&["#ff0000", "00f"]).unwrap();
        assert_eq!(colors, vec![Srgb::new(255, 0, 0), Srgb::new(0, 0, 255)]);

        let none: [&str; 0] = [];
        assert!(matches!(parse_palette(&none), Err(ThemeError::EmptyPalette)));
        assert!(matches!(parse_palette(&["#12345"]), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_remap_palette() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([250, 250, 240, 255]));
        let out = remap_palette(&img, &["#000000", "#ffffff"]).unwrap();
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_png_round_trip() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let png = encode_png(&img).unwrap();
        assert_eq!(decode_rgba(&png).unwrap(), img);
    }

    #[test]
    fn test_decode_garbage_is_processing_failure() {
        let err = decode_rgba(b"definitely not an image").unwrap_err();
        assert!(!err.is_validation());
    }
}

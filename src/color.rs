//! Color-space conversions and hex notation.
//!
//! Clustering happens in CIE L*a*b* (D65). LCH and HSL are offered for the
//! palette editing surface and never feed the clustering path.

use palette::{FromColor, Hsl, Lab, Lch, Srgb};

use crate::error::{Result, ThemeError};

/// Pixels with an alpha below this value are treated as transparent: they are
/// skipped by sampling and clustering and never recolored.
pub const ALPHA_THRESHOLD: u8 = 10;

#[inline(always)]
pub fn is_opaque(alpha: u8) -> bool {
    alpha >= ALPHA_THRESHOLD
}

/// Convert an 8-bit sRGB color to L*a*b*.
pub fn rgb_to_lab(rgb: Srgb<u8>) -> Lab {
    Lab::from_color(rgb.into_format::<f32>())
}

/// Convert L*a*b* back to 8-bit sRGB, clamping each channel to `0..=255` and
/// rounding to the nearest integer.
pub fn lab_to_rgb(lab: Lab) -> Srgb<u8> {
    Srgb::<f32>::from_color(lab).into_format()
}

pub fn rgb_to_lch(rgb: Srgb<u8>) -> Lch {
    Lch::from_color(rgb.into_format::<f32>())
}

pub fn lch_to_rgb(lch: Lch) -> Srgb<u8> {
    Srgb::<f32>::from_color(lch).into_format()
}

/// Convert to HSL. Saturation and lightness are in `0.0..=1.0`; hue is in
/// degrees and reads `0` for grays.
pub fn rgb_to_hsl(rgb: Srgb<u8>) -> Hsl {
    Hsl::from_color(rgb.into_format::<f32>())
}

/// Convert HSL to 8-bit sRGB. Out-of-range saturation and lightness are
/// clamped and the hue is wrapped into `0..360`.
pub fn hsl_to_rgb(hsl: Hsl) -> Srgb<u8> {
    let hue = hsl.hue.into_positive_degrees();
    let clamped: Hsl = Hsl::new(
        hue,
        hsl.saturation.clamp(0.0, 1.0),
        hsl.lightness.clamp(0.0, 1.0),
    );
    Srgb::<f32>::from_color(clamped).into_format()
}

/// Squared Euclidean distance between two L*a*b* colors.
#[inline(always)]
pub fn lab_distance_squared(a: &Lab, b: &Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    dl * dl + da * da + db * db
}

/// Format a color as lowercase `#rrggbb`.
pub fn to_hex(rgb: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// Parse `#rgb` or `#rrggbb`. The leading `#` is optional and surrounding
/// whitespace is ignored.
pub fn parse_hex(s: &str) -> Result<Srgb<u8>> {
    let trimmed = s.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let invalid = || ThemeError::InvalidHex(s.to_string());

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match hex.len() {
        3 => {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8 * 17))
                .collect::<Option<_>>()
                .ok_or_else(invalid)?;
            Ok(Srgb::new(digits[0], digits[1], digits[2]))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            Ok(Srgb::new(channel(0)?, channel(2)?, channel(4)?))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn channel_delta(a: u8, b: u8) -> u8 {
        a.abs_diff(b)
    }

    #[test]
    fn test_lab_reference_values() {
        let white = rgb_to_lab(Srgb::new(255, 255, 255));
        assert!((white.l - 100.0).abs() < 0.01);
        assert!(white.a.abs() < 0.01);
        assert!(white.b.abs() < 0.01);

        let black = rgb_to_lab(Srgb::new(0, 0, 0));
        assert!(black.l.abs() < 0.01);

        let red = rgb_to_lab(Srgb::new(255, 0, 0));
        assert!((red.l - 53.24).abs() < 0.1);
        assert!((red.a - 80.09).abs() < 0.2);
        assert!((red.b - 67.20).abs() < 0.2);
    }

    #[test]
    fn test_lab_to_rgb_clamps() {
        let bright: Lab = Lab::new(100.0, 120.0, -120.0);
        let rgb = lab_to_rgb(bright);
        assert_eq!(rgb.red, 255);
        assert_eq!(rgb.blue, 255);
    }

    #[test]
    fn test_hsl_primaries() {
        let hsl = rgb_to_hsl(Srgb::new(0, 0, 255));
        assert!((hsl.hue.into_positive_degrees() - 240.0).abs() < 0.01);
        assert!((hsl.saturation - 1.0).abs() < 1e-4);
        assert!((hsl.lightness - 0.5).abs() < 1e-4);
        assert_eq!(hsl_to_rgb(hsl), Srgb::new(0, 0, 255));
    }

    #[test]
    fn test_hsl_to_rgb_wraps_and_clamps() {
        let hsl: Hsl = Hsl::new(480.0, 1.7, 0.5);
        assert_eq!(hsl_to_rgb(hsl), Srgb::new(0, 255, 0));
    }

    #[test]
    fn test_lch_gray_has_no_chroma() {
        let lch = rgb_to_lch(Srgb::new(128, 128, 128));
        assert!(lch.chroma < 0.01);
        assert_eq!(lch_to_rgb(lch), Srgb::new(128, 128, 128));
    }

    #[test]
    fn test_hex_format_and_parse() {
        assert_eq!(to_hex(Srgb::new(255, 8, 171)), "#ff08ab");
        assert_eq!(parse_hex("#ff08ab").unwrap(), Srgb::new(255, 8, 171));
        assert_eq!(parse_hex("FF08AB").unwrap(), Srgb::new(255, 8, 171));
        assert_eq!(parse_hex(" #f0a ").unwrap(), Srgb::new(255, 0, 170));
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#ff08a"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#gg0000"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex(""), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_opacity_threshold() {
        assert!(!is_opaque(0));
        assert!(!is_opaque(9));
        assert!(is_opaque(10));
        assert!(is_opaque(255));
    }

    proptest! {
        #[test]
        fn lab_round_trip_within_one(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let back = lab_to_rgb(rgb_to_lab(Srgb::new(r, g, b)));
            prop_assert!(channel_delta(back.red, r) <= 1);
            prop_assert!(channel_delta(back.green, g) <= 1);
            prop_assert!(channel_delta(back.blue, b) <= 1);
        }

        #[test]
        fn lch_round_trip_within_one(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let back = lch_to_rgb(rgb_to_lch(Srgb::new(r, g, b)));
            prop_assert!(channel_delta(back.red, r) <= 1);
            prop_assert!(channel_delta(back.green, g) <= 1);
            prop_assert!(channel_delta(back.blue, b) <= 1);
        }

        #[test]
        fn hex_round_trip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let rgb = Srgb::new(r, g, b);
            prop_assert_eq!(parse_hex(&to_hex(rgb)).unwrap(), rgb);
        }
    }
}

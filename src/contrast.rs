//! WCAG 2 contrast checks between two palette colors.

use palette::Srgb;

/// Accessibility grade reached by a contrast ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContrastGrade {
    Fail,
    /// Enough for large text only (>= 3:1)
    AaLarge,
    /// >= 4.5:1
    Aa,
    /// >= 7:1
    Aaa,
}

/// sRGB channel to linear light. Uses the WCAG 2.0 cutoff of 0.03928 rather
/// than 0.04045 so ratios agree with the browser contrast checker.
fn linearize(channel: u8) -> f64 {
    let v = channel as f64 / 255.0;
    if v <= 0.03928 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance in `0.0..=1.0`.
pub fn relative_luminance(rgb: Srgb<u8>) -> f64 {
    0.2126 * linearize(rgb.red) + 0.7152 * linearize(rgb.green) + 0.0722 * linearize(rgb.blue)
}

/// Contrast ratio between two colors, from `1.0` (identical) to `21.0`.
/// Argument order does not matter.
pub fn contrast_ratio(fg: Srgb<u8>, bg: Srgb<u8>) -> f64 {
    let l1 = relative_luminance(fg) + 0.05;
    let l2 = relative_luminance(bg) + 0.05;
    if l1 > l2 { l1 / l2 } else { l2 / l1 }
}

pub fn grade(ratio: f64) -> ContrastGrade {
    if ratio >= 7.0 {
        ContrastGrade::Aaa
    } else if ratio >= 4.5 {
        ContrastGrade::Aa
    } else if ratio >= 3.0 {
        ContrastGrade::AaLarge
    } else {
        ContrastGrade::Fail
    }
}

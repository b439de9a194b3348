//! Order cluster centroids into the final palette.

use palette::{Lab, Srgb};

use crate::color::{lab_to_rgb, to_hex};

/// One palette color and the number of sampled pixels it represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: Srgb<u8>,
    pub weight: usize,
}

impl PaletteEntry {
    pub fn hex(&self) -> String {
        to_hex(self.color)
    }
}

/// Sort centroids by population, most dominant first. Equal populations keep
/// their cluster order. Colors are rounded to 8-bit sRGB here and nowhere
/// earlier.
pub fn rank(centroids: &[Lab], counts: &[usize]) -> Vec<PaletteEntry> {
    let mut entries: Vec<PaletteEntry> = centroids
        .iter()
        .zip(counts)
        .map(|(&lab, &weight)| PaletteEntry {
            color: lab_to_rgb(lab),
            weight,
        })
        .collect();
    entries.sort_by(|a, b| b.weight.cmp(&a.weight));
    entries
}

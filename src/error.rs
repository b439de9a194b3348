//! Error type shared by every stage of the extraction pipeline.

use thiserror::Error;

/// Failures reported by the extraction engine.
///
/// Validation variants are raised before any work starts. Everything that goes
/// wrong once a run is underway collapses into [`ThemeError::ProcessingFailed`].
#[derive(Debug, Error)]
pub enum ThemeError {
    /// A tuning option is outside its valid range
    #[error("{name} must be at least 1, got {value}")]
    InvalidOption { name: &'static str, value: usize },
    /// Raw pixel data does not match the declared dimensions
    #[error("pixel buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA image")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// A palette color could not be parsed
    #[error("invalid hex color '{0}'")]
    InvalidHex(String),
    /// A hue rotation angle is NaN or infinite
    #[error("hue shift must be a finite number of degrees, got {0}")]
    InvalidHue(f32),
    /// A custom palette was requested with no colors in it
    #[error("palette must contain at least one color")]
    EmptyPalette,
    /// Decoding, encoding, or a pipeline stage failed
    #[error("processing failed")]
    ProcessingFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ThemeError {
    pub(crate) fn processing<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ThemeError::ProcessingFailed(err.into())
    }

    /// Whether the error was raised before any work was performed.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ThemeError::ProcessingFailed(_))
    }
}

impl From<image::ImageError> for ThemeError {
    fn from(err: image::ImageError) -> Self {
        ThemeError::processing(err)
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;

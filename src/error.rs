use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating plates in a single image.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("malformed image ({width}x{height}): {reason}")]
    MalformedImage {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("gradient maps differ in size: vertical {vertical:?}, horizontal {horizontal:?}")]
    MapSizeMismatch {
        vertical: (u32, u32),
        horizontal: (u32, u32),
    },

    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Invalid detector configuration. Surfaced before any image is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{option}: kernel dimension must be in 1..={max}, got {value}")]
    KernelSize {
        option: &'static str,
        value: u32,
        max: u32,
    },

    #[error("{option}: must be positive and finite, got {value}")]
    NonPositive { option: &'static str, value: f32 },

    #[error("{option}: fraction must be in (0, 1], got {value}")]
    Fraction { option: &'static str, value: f32 },

    #[error("{option}: lower bound {lower} exceeds upper bound {upper}")]
    InvertedRange {
        option: &'static str,
        lower: f32,
        upper: f32,
    },

    #[error("color range `{name}`: {reason}")]
    ColorRange { name: String, reason: String },
}
